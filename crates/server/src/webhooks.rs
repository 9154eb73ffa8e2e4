//! Twilio webhook handlers
//!
//! Every handler answers TwiML, even on failure: a caller mid-call must
//! hear an apology and a hangup, never a raw 500. The response handler
//! is the conversation loop; each delivery reconstructs history from the
//! call log, advances the engine one turn and persists the new turns
//! before answering. A per-lead mutex serializes concurrent deliveries
//! for the same lead.

use axum::extract::{Form, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;

use leadcall_agent::{should_allow_call, ConversationEngine, TurnOutcome};
use leadcall_core::{CallLogStatus, Lead, LeadStatus, Turn};
use leadcall_store::LeadUpdate;
use leadcall_telephony::{
    AmdWebhook, RecordingWebhook, ResponseWebhook, StatusWebhook, TwimlBuilder, VoiceWebhook,
};

use crate::calls::{opening_script, BLOCKED_NOTE};
use crate::state::AppState;
use crate::sync;

const GATHER_TIMEOUT_SECS: u32 = 5;

const APOLOGY: &str = "I'm sorry, we're having technical difficulties. \
                       We'll get back to you soon. Goodbye.";
const AFTER_HOURS: &str = "I'm sorry for calling outside business hours. \
                           We'll reach out another time. Goodbye.";
const REPROMPT: &str = "I'm sorry, I didn't catch that. Could you say it again?";

#[derive(Debug, Deserialize)]
pub struct LeadIdQuery {
    pub lead_id: i64,
}

fn twiml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}

fn apology_hangup() -> Response {
    twiml(TwimlBuilder::new().say(APOLOGY).hangup().build())
}

fn response_action(callback_url: &str, lead_id: i64) -> String {
    format!(
        "{}/webhook/response?lead_id={lead_id}",
        callback_url.trim_end_matches('/')
    )
}

/// Rendered audio URL for `text`, or `None` for the gateway voice
async fn render(state: &AppState, text: &str) -> Option<String> {
    state
        .speech
        .synthesize(text)
        .await
        .ok()
        .flatten()
        .map(|a| a.url)
}

/// Speak the prompt inside a gather so the lead can answer over it,
/// with a redirect fallback when the gather times out.
fn gather_prompt(action: &str, audio: Option<String>, text: &str) -> String {
    TwimlBuilder::new()
        .gather_speech(action, GATHER_TIMEOUT_SECS, |p| {
            p.speak(audio.as_deref(), text)
        })
        .redirect(action)
        .build()
}

/// `POST /webhook/voice`: the call connected. Re-check admission (the
/// dial may have raced the end of the window), log the opening line and
/// gather the lead's first response.
pub async fn voice(
    State(state): State<AppState>,
    Query(query): Query<LeadIdQuery>,
    Form(hook): Form<VoiceWebhook>,
) -> Response {
    let lock = state.lead_lock(query.lead_id);
    let _guard = lock.lock().await;

    let lead = match state.store.get_lead(query.lead_id) {
        Ok(Some(lead)) => lead,
        Ok(None) => {
            tracing::warn!(lead_id = query.lead_id, call_sid = %hook.call_sid, "voice webhook for unknown lead");
            return apology_hangup();
        }
        Err(err) => {
            tracing::error!(lead_id = query.lead_id, error = %err, "voice webhook store failure");
            return apology_hangup();
        }
    };

    let config = state.config_snapshot();
    let latest = state.store.latest_call_log(lead.id).ok().flatten();
    if !should_allow_call(Utc::now(), &config.business_hours, config.test_mode, latest.as_ref()) {
        tracing::warn!(lead_id = lead.id, "connected call blocked by time restrictions");
        if let Err(err) = state
            .store
            .append_call_log(lead.id, CallLogStatus::Failed, BLOCKED_NOTE)
        {
            tracing::error!(lead_id = lead.id, error = %err, "failed to log blocked call");
        }
        return twiml(TwimlBuilder::new().say(AFTER_HOURS).hangup().build());
    }

    let script = opening_script(&lead);
    if let Err(err) = state.store.append_call_log(
        lead.id,
        CallLogStatus::Started,
        &Turn::assistant(script.clone()).to_transcript(),
    ) {
        tracing::error!(lead_id = lead.id, error = %err, "failed to log call start");
        return apology_hangup();
    }
    sync::spawn_lead_sync(&state, lead.id);

    let action = response_action(&config.callback_url, lead.id);
    let audio = render(&state, &script).await;
    twiml(gather_prompt(&action, audio, &script))
}

/// `POST /webhook/response`: one recognized utterance. Advance the
/// conversation, persist both turns and either keep gathering or close.
pub async fn response(
    State(state): State<AppState>,
    Query(query): Query<LeadIdQuery>,
    Form(hook): Form<ResponseWebhook>,
) -> Response {
    let lock = state.lead_lock(query.lead_id);
    let _guard = lock.lock().await;

    let lead = match state.store.get_lead(query.lead_id) {
        Ok(Some(lead)) => lead,
        Ok(None) => {
            tracing::warn!(lead_id = query.lead_id, "response webhook for unknown lead");
            return apology_hangup();
        }
        Err(err) => {
            tracing::error!(lead_id = query.lead_id, error = %err, "response webhook store failure");
            return apology_hangup();
        }
    };

    let config = state.config_snapshot();
    let action = response_action(&config.callback_url, lead.id);

    // A silent gather re-prompts rather than advancing the script.
    let Some(utterance) = hook.utterance() else {
        let audio = render(&state, REPROMPT).await;
        return twiml(gather_prompt(&action, audio, REPROMPT));
    };

    let history = match state.store.history_for_lead(lead.id) {
        Ok(history) => history,
        Err(err) => {
            tracing::error!(lead_id = lead.id, error = %err, "history reconstruction failed");
            return apology_hangup();
        }
    };

    let engine = ConversationEngine::new(state.oracle.clone(), config.test_mode);
    let outcome = match engine.advance(utterance, &lead, history, Utc::now()).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(lead_id = lead.id, error = %err, "conversation turn failed");
            return apology_hangup();
        }
    };

    let terminal = outcome.result.is_complete();
    let bot_status = if terminal {
        CallLogStatus::Completed
    } else {
        CallLogStatus::InProgress
    };
    let logged = state
        .store
        .append_call_log(
            lead.id,
            CallLogStatus::InProgress,
            &Turn::user(utterance).to_transcript(),
        )
        .and_then(|_| {
            state.store.append_call_log(
                lead.id,
                bot_status,
                &Turn::assistant(outcome.utterance.clone()).to_transcript(),
            )
        });
    if let Err(err) = logged {
        tracing::error!(lead_id = lead.id, error = %err, "failed to persist turn");
        return apology_hangup();
    }

    if let Err(err) = apply_outcome(&state, &lead, &outcome) {
        tracing::error!(lead_id = lead.id, error = %err, "failed to persist outcome");
        return apology_hangup();
    }

    let audio = render(&state, &outcome.utterance).await;
    let body = if terminal {
        TwimlBuilder::new()
            .speak(audio.as_deref(), &outcome.utterance)
            .hangup()
            .build()
    } else {
        gather_prompt(&action, audio, &outcome.utterance)
    };
    twiml(body)
}

/// Persist what the turn concluded: extracted qualification signals on
/// every turn, and on a terminal turn the lead status, the appointment
/// or follow-up, and the CRM pushes.
fn apply_outcome(
    state: &AppState,
    lead: &Lead,
    outcome: &TurnOutcome,
) -> Result<(), leadcall_store::StoreError> {
    let result = &outcome.result;

    let update = LeadUpdate {
        uses_mobile_devices: result.uses_mobile,
        employee_count: result.employee_count,
        ..LeadUpdate::default()
    };
    if !update.is_empty() {
        state.store.update_lead(lead.id, &update)?;
    }

    if !result.is_complete() {
        return Ok(());
    }

    if result.appointment_set {
        let date = result.appointment_date.as_deref().unwrap_or("TBD");
        let time = result.appointment_time.as_deref().unwrap_or("TBD");
        let appointment_id =
            state
                .store
                .create_appointment(lead.id, date, time, Default::default())?;
        let cancelled = state.store.cancel_pending_follow_ups(lead.id)?;
        tracing::info!(
            lead_id = lead.id,
            appointment_id,
            date,
            time,
            cancelled,
            "appointment booked"
        );
        sync::spawn_appointment_sync(state, appointment_id);
        sync::spawn_qualification_sync(state, lead.id);
        return Ok(());
    }

    state.store.update_lead_status(lead.id, LeadStatus::Completed)?;
    if result.qualified == Some(false) {
        state.store.update_lead(
            lead.id,
            &LeadUpdate {
                qualification_status: Some(leadcall_core::Qualification::NotQualified),
                ..LeadUpdate::default()
            },
        )?;
    }

    if let Some(follow_up) = &outcome.follow_up {
        let id = state.store.create_follow_up(
            lead.id,
            follow_up.scheduled_time,
            follow_up.priority,
            &follow_up.reason,
        )?;
        tracing::info!(
            lead_id = lead.id,
            follow_up_id = id,
            priority = follow_up.priority,
            scheduled = %follow_up.scheduled_time,
            reason = %follow_up.reason,
            "follow-up scheduled"
        );
    }
    sync::spawn_qualification_sync(state, lead.id);
    Ok(())
}

/// `POST /webhook/status`: provider lifecycle updates. Terminal statuses
/// settle a lead still marked `Calling` into `CallAttempted`; a lead the
/// conversation already concluded keeps its final status.
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<LeadIdQuery>,
    Form(hook): Form<StatusWebhook>,
) -> Response {
    let lock = state.lead_lock(query.lead_id);
    let _guard = lock.lock().await;

    if let Err(err) = state.store.append_call_log(
        query.lead_id,
        CallLogStatus::Provider(hook.call_status.clone()),
        &format!("Call {}", hook.call_status),
    ) {
        tracing::warn!(lead_id = query.lead_id, error = %err, "failed to log call status");
    }

    if hook.is_terminal() {
        match state.store.get_lead(query.lead_id) {
            Ok(Some(lead)) if lead.status == LeadStatus::Calling => {
                if let Err(err) = state
                    .store
                    .update_lead_status(lead.id, LeadStatus::CallAttempted)
                {
                    tracing::warn!(lead_id = lead.id, error = %err, "failed to settle lead status");
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(lead_id = query.lead_id, error = %err, "status webhook store failure");
            }
        }
    }
    twiml(TwimlBuilder::new().build())
}

/// `POST /webhook/amd`: async answering-machine detection verdict. A
/// machine ends the call; there is no point talking to voicemail.
pub async fn amd(
    State(state): State<AppState>,
    Query(query): Query<LeadIdQuery>,
    Form(hook): Form<AmdWebhook>,
) -> Response {
    let lock = state.lead_lock(query.lead_id);
    let _guard = lock.lock().await;

    if let Err(err) = state.store.append_call_log(
        query.lead_id,
        CallLogStatus::AmdDetection,
        &format!("Answered by {}", hook.answered_by),
    ) {
        tracing::warn!(lead_id = query.lead_id, error = %err, "failed to log AMD verdict");
    }

    if hook.is_machine() {
        tracing::info!(lead_id = query.lead_id, verdict = %hook.answered_by, "machine answered, ending call");
        if let Err(err) = state
            .store
            .update_lead_status(query.lead_id, LeadStatus::CallAttempted)
        {
            tracing::warn!(lead_id = query.lead_id, error = %err, "failed to settle lead status");
        }
        return twiml(TwimlBuilder::new().hangup().build());
    }
    twiml(TwimlBuilder::new().build())
}

/// `POST /webhook/recording`: attach the recording URL to the latest
/// call-log entry. A lead with no entries is ignored.
pub async fn recording(
    State(state): State<AppState>,
    Query(query): Query<LeadIdQuery>,
    Form(hook): Form<RecordingWebhook>,
) -> Response {
    let lock = state.lead_lock(query.lead_id);
    let _guard = lock.lock().await;

    match state
        .store
        .append_to_latest_transcript(query.lead_id, &format!("Recording: {}", hook.recording_url))
    {
        Ok(true) => {
            tracing::info!(lead_id = query.lead_id, url = %hook.recording_url, "recording attached");
        }
        Ok(false) => {
            tracing::warn!(lead_id = query.lead_id, "recording for lead with no call log");
        }
        Err(err) => {
            tracing::warn!(lead_id = query.lead_id, error = %err, "failed to attach recording");
        }
    }
    twiml(TwimlBuilder::new().build())
}
