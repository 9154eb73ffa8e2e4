//! Due follow-up sweep
//!
//! A background interval task that dials leads whose follow-ups have
//! come due, most urgent first. Bulk dialing uses the strict hours-only
//! gate: unlike a webhook for a call already in flight, the sweep never
//! starts anything outside the calling window.

use chrono::Utc;

use leadcall_agent::is_within_call_hours;
use leadcall_core::FollowUpStatus;
use leadcall_store::StoreError;

use crate::calls::{self, CallError};
use crate::state::AppState;

/// Run the sweep forever at the configured interval
pub async fn run(state: AppState) {
    let interval_secs = state.config_snapshot().sweep.interval_secs;
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        match sweep_once(&state).await {
            Ok(0) => {}
            Ok(dialed) => tracing::info!(dialed, "follow-up sweep complete"),
            Err(err) => tracing::error!(error = %err, "follow-up sweep failed"),
        }
    }
}

/// One sweep pass. Returns the number of leads dialed.
pub async fn sweep_once(state: &AppState) -> Result<usize, StoreError> {
    let config = state.config_snapshot();
    if !config.sweep.enabled {
        return Ok(0);
    }
    let now = Utc::now();
    if !is_within_call_hours(now, &config.business_hours) {
        tracing::debug!("outside calling hours, skipping sweep");
        return Ok(0);
    }

    let due = state.store.due_follow_ups(now, config.sweep.batch_size)?;
    let mut dialed = 0usize;

    for follow_up in due {
        state
            .store
            .update_follow_up_status(follow_up.id, FollowUpStatus::InProgress)?;

        let Some(lead) = state.store.get_lead(follow_up.lead_id)? else {
            tracing::warn!(follow_up_id = follow_up.id, "follow-up for vanished lead");
            state
                .store
                .update_follow_up_status(follow_up.id, FollowUpStatus::Cancelled)?;
            continue;
        };

        let lock = state.lead_lock(lead.id);
        let _guard = lock.lock().await;

        match calls::start_call(state, &lead).await {
            Ok(sid) => {
                tracing::info!(
                    lead_id = lead.id,
                    follow_up_id = follow_up.id,
                    %sid,
                    reason = %follow_up.reason,
                    "follow-up call placed"
                );
                state
                    .store
                    .update_follow_up_status(follow_up.id, FollowUpStatus::Completed)?;
                dialed += 1;
            }
            Err(CallError::Denied) => {
                // The window closed mid-sweep; put the rest back.
                state
                    .store
                    .update_follow_up_status(follow_up.id, FollowUpStatus::Pending)?;
                break;
            }
            Err(err) => {
                tracing::warn!(
                    lead_id = lead.id,
                    follow_up_id = follow_up.id,
                    error = ?err,
                    "follow-up dial failed"
                );
                state
                    .store
                    .update_follow_up_status(follow_up.id, FollowUpStatus::Pending)?;
            }
        }
    }
    Ok(dialed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{always_closed_settings, always_open_settings, seed_lead, state_with};
    use chrono::Duration;
    use leadcall_core::LeadStatus;

    #[tokio::test]
    async fn sweep_dials_due_follow_ups() {
        let state = state_with(always_open_settings(), Vec::new());
        let lead = seed_lead(&state.store);
        let follow_up = state
            .store
            .create_follow_up(lead, Utc::now() - Duration::minutes(5), 6, "callback requested")
            .unwrap();

        let dialed = sweep_once(&state).await.unwrap();
        assert_eq!(dialed, 1);

        let follow_ups = state.store.list_follow_ups(Some(lead)).unwrap();
        assert_eq!(follow_ups[0].id, follow_up);
        assert_eq!(follow_ups[0].status, FollowUpStatus::Completed);
        let lead = state.store.get_lead(lead).unwrap().unwrap();
        assert_eq!(lead.status, LeadStatus::Calling);
    }

    #[tokio::test]
    async fn future_follow_ups_are_left_alone() {
        let state = state_with(always_open_settings(), Vec::new());
        let lead = seed_lead(&state.store);
        state
            .store
            .create_follow_up(lead, Utc::now() + Duration::hours(2), 6, "callback requested")
            .unwrap();

        assert_eq!(sweep_once(&state).await.unwrap(), 0);
        let follow_ups = state.store.list_follow_ups(Some(lead)).unwrap();
        assert_eq!(follow_ups[0].status, FollowUpStatus::Pending);
    }

    #[tokio::test]
    async fn sweep_never_dials_outside_hours_even_in_test_mode() {
        let mut settings = always_closed_settings();
        settings.test_mode = true;
        let state = state_with(settings, Vec::new());
        let lead = seed_lead(&state.store);
        state
            .store
            .create_follow_up(lead, Utc::now() - Duration::minutes(5), 6, "callback requested")
            .unwrap();

        assert_eq!(sweep_once(&state).await.unwrap(), 0);
        let follow_ups = state.store.list_follow_ups(Some(lead)).unwrap();
        assert_eq!(follow_ups[0].status, FollowUpStatus::Pending);
    }

    #[tokio::test]
    async fn disabled_sweep_is_a_no_op() {
        let mut settings = always_open_settings();
        settings.sweep.enabled = false;
        let state = state_with(settings, Vec::new());
        let lead = seed_lead(&state.store);
        state
            .store
            .create_follow_up(lead, Utc::now() - Duration::minutes(5), 6, "callback requested")
            .unwrap();

        assert_eq!(sweep_once(&state).await.unwrap(), 0);
    }
}
