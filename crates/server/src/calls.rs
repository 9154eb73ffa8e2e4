//! Outbound call origination
//!
//! Shared by `POST /api/call` and the follow-up sweep: admission gate,
//! denial logging, status transition and the telephony dial. The opening
//! script itself is spoken (and logged) by the voice webhook once the
//! call actually connects.

use chrono::Utc;

use leadcall_core::{CallLogStatus, Lead, LeadStatus};
use leadcall_store::StoreError;
use leadcall_telephony::{OutboundCall, TelephonyError};

use leadcall_agent::should_allow_call;

use crate::state::AppState;

pub const BLOCKED_NOTE: &str = "Call blocked by time restrictions";

#[derive(Debug)]
pub enum CallError {
    /// The admission gate refused to start a call
    Denied,
    Store(StoreError),
    Telephony(TelephonyError),
}

impl From<StoreError> for CallError {
    fn from(err: StoreError) -> Self {
        CallError::Store(err)
    }
}

impl From<TelephonyError> for CallError {
    fn from(err: TelephonyError) -> Self {
        CallError::Telephony(err)
    }
}

/// The scripted greeting for a lead. Industry and city soften out when
/// the record lacks them.
pub fn opening_script(lead: &Lead) -> String {
    let mut script = format!(
        "Hello, is this {}? This is Ava with Mobile Solutions. I'll be brief.",
        lead.contact_first_name()
    );
    if let Some(industry) = lead.industry_context() {
        if lead.city.is_empty() {
            script.push_str(&format!(
                " I understand your company provides {industry} services."
            ));
        } else {
            script.push_str(&format!(
                " I understand your company provides {industry} services in {}.",
                lead.city
            ));
        }
    }
    script.push_str(" Quick question: do your field crews use mobile phones or tablets for work?");
    script
}

/// Webhook URLs for one call, built from the public callback base
pub fn webhook_urls(callback_url: &str, lead_id: i64) -> OutboundCall {
    let base = callback_url.trim_end_matches('/');
    OutboundCall {
        to: String::new(),
        voice_url: format!("{base}/webhook/voice?lead_id={lead_id}"),
        status_callback_url: format!("{base}/webhook/status?lead_id={lead_id}"),
        amd_callback_url: format!("{base}/webhook/amd?lead_id={lead_id}"),
        recording_callback_url: format!("{base}/webhook/recording?lead_id={lead_id}"),
    }
}

/// Gate, mark and dial one lead. A denial leaves a `Failed` call-log
/// entry; success moves the lead to `Calling` and returns the call SID.
pub async fn start_call(state: &AppState, lead: &Lead) -> Result<String, CallError> {
    let config = state.config_snapshot();
    let latest = state.store.latest_call_log(lead.id)?;
    if !should_allow_call(
        Utc::now(),
        &config.business_hours,
        config.test_mode,
        latest.as_ref(),
    ) {
        tracing::warn!(lead_id = lead.id, "call blocked by time restrictions");
        state
            .store
            .append_call_log(lead.id, CallLogStatus::Failed, BLOCKED_NOTE)?;
        return Err(CallError::Denied);
    }

    state.store.update_lead_status(lead.id, LeadStatus::Calling)?;

    let call = OutboundCall {
        to: lead.phone.clone(),
        ..webhook_urls(&config.callback_url, lead.id)
    };
    let sid = state.telephony.place_call(&call).await?;
    Ok(sid)
}
