//! Fire-and-forget Zoho pushes
//!
//! Every entry point spawns off the request path and only logs failures;
//! local records never wait on, or roll back for, the CRM. Record ids
//! come back as note markers on the local rows so later pushes can
//! update instead of duplicate.

use leadcall_core::Lead;
use leadcall_crm::{extract_marker, marker_note, CrmError, EVENT_ID_MARKER, LEAD_ID_MARKER};

use crate::state::AppState;

/// Push the lead record, creating it in the CRM on first contact
pub fn spawn_lead_sync(state: &AppState, lead_id: i64) {
    if state.crm.is_none() {
        return;
    }
    let state = state.clone();
    tokio::spawn(async move {
        if let Err(err) = sync_lead(&state, lead_id).await {
            tracing::warn!(lead_id, error = %err, "CRM lead sync failed");
        }
    });
}

/// Push qualification results onto the linked CRM lead
pub fn spawn_qualification_sync(state: &AppState, lead_id: i64) {
    if state.crm.is_none() {
        return;
    }
    let state = state.clone();
    tokio::spawn(async move {
        if let Err(err) = sync_qualification(&state, lead_id).await {
            tracing::warn!(lead_id, error = %err, "CRM qualification sync failed");
        }
    });
}

/// Push an appointment as a CRM calendar event, creating or moving it
pub fn spawn_appointment_sync(state: &AppState, appointment_id: i64) {
    if state.crm.is_none() {
        return;
    }
    let state = state.clone();
    tokio::spawn(async move {
        if let Err(err) = sync_appointment(&state, appointment_id).await {
            tracing::warn!(appointment_id, error = %err, "CRM event sync failed");
        }
    });
}

#[derive(Debug, thiserror::Error)]
enum SyncError {
    #[error("{0}")]
    Crm(#[from] CrmError),
    #[error("{0}")]
    Store(#[from] leadcall_store::StoreError),
    #[error("{0} {1} not found")]
    Missing(&'static str, i64),
}

/// Ensure the lead exists in the CRM, returning its record id
async fn ensure_crm_lead(state: &AppState, lead: &Lead) -> Result<String, SyncError> {
    let crm = state.crm.as_ref().ok_or(CrmError::Unconfigured)?;
    if let Some(id) = extract_marker(&lead.notes, LEAD_ID_MARKER) {
        return Ok(id);
    }
    let id = crm.create_lead(lead).await?;
    state
        .store
        .append_note(lead.id, &marker_note(LEAD_ID_MARKER, &id))?;
    tracing::info!(lead_id = lead.id, crm_id = %id, "lead pushed to CRM");
    Ok(id)
}

async fn sync_lead(state: &AppState, lead_id: i64) -> Result<(), SyncError> {
    let lead = state
        .store
        .get_lead(lead_id)?
        .ok_or(SyncError::Missing("lead", lead_id))?;
    ensure_crm_lead(state, &lead).await?;
    Ok(())
}

async fn sync_qualification(state: &AppState, lead_id: i64) -> Result<(), SyncError> {
    let crm = state.crm.as_ref().ok_or(CrmError::Unconfigured)?;
    let lead = state
        .store
        .get_lead(lead_id)?
        .ok_or(SyncError::Missing("lead", lead_id))?;
    let crm_id = ensure_crm_lead(state, &lead).await?;
    crm.update_lead_qualification(
        &crm_id,
        lead.qualification_status,
        lead.uses_mobile_devices,
        lead.employee_count,
        &lead.notes,
    )
    .await?;
    Ok(())
}

async fn sync_appointment(state: &AppState, appointment_id: i64) -> Result<(), SyncError> {
    let crm = state.crm.as_ref().ok_or(CrmError::Unconfigured)?;
    let appointment = state
        .store
        .get_appointment(appointment_id)?
        .ok_or(SyncError::Missing("appointment", appointment_id))?;
    let lead = state
        .store
        .get_lead(appointment.lead_id)?
        .ok_or(SyncError::Missing("lead", appointment.lead_id))?;
    let crm_lead_id = ensure_crm_lead(state, &lead).await?;

    match extract_marker(&appointment.notes, EVENT_ID_MARKER) {
        Some(event_id) => {
            crm.update_event(
                &event_id,
                &appointment.date,
                &appointment.time,
                appointment.medium,
            )
            .await?;
        }
        None => {
            let event_id = crm
                .create_event(
                    &lead,
                    &appointment.date,
                    &appointment.time,
                    appointment.medium,
                    Some(&crm_lead_id),
                )
                .await?;
            state
                .store
                .append_appointment_note(appointment.id, &marker_note(EVENT_ID_MARKER, &event_id))?;
            tracing::info!(appointment_id, crm_id = %event_id, "event pushed to CRM");
        }
    }
    Ok(())
}
