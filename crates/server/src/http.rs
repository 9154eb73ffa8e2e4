//! HTTP endpoints
//!
//! REST API for the dashboard plus the Twilio webhook routes. API
//! handlers answer JSON and plain status codes; webhook handlers always
//! answer TwiML and live in `webhooks`.

use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, patch, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use leadcall_config::BusinessHoursConfig;
use leadcall_core::{AppointmentMedium, FollowUpStatus, LeadStatus, MobileUsage, Qualification};
use leadcall_store::{AppointmentUpdate, LeadUpdate, NewLead, StoreError};

use crate::calls::{self, CallError};
use crate::state::AppState;
use crate::sync;
use crate::webhooks;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config_snapshot();
    let cors_layer = build_cors_layer(&config.server.cors_origins);
    let audio_dir = config.speech.output_dir.clone();

    Router::new()
        // Leads
        .route("/api/leads", get(list_leads).post(create_lead))
        .route(
            "/api/leads/:id",
            get(get_lead).patch(update_lead).delete(delete_lead),
        )
        .route("/api/leads/:id/qualify", post(qualify_lead))
        // Calls
        .route("/api/call", post(start_call))
        .route("/api/call_logs/:lead_id", get(call_logs).post(append_call_log))
        // Appointments
        .route("/api/appointments", get(list_appointments).post(create_appointment))
        .route("/api/appointments/:id", patch(update_appointment))
        .route("/api/availability", get(availability))
        // Follow-ups
        .route("/api/follow_ups", get(list_follow_ups))
        .route("/api/follow_ups/:id", patch(update_follow_up))
        // Lead sourcing
        .route("/api/scrape", post(scrape))
        // Runtime configuration
        .route("/api/config", get(get_config).post(update_config))
        // Health check
        .route("/health", get(health))
        // Telephony webhooks
        .route("/webhook/voice", post(webhooks::voice))
        .route("/webhook/response", post(webhooks::response))
        .route("/webhook/status", post(webhooks::status))
        .route("/webhook/amd", post(webhooks::amd))
        .route("/webhook/recording", post(webhooks::recording))
        // Synthesized audio for <Play>
        .nest_service("/audio", ServeDir::new(audio_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build the CORS layer from configured origins; empty or unparseable
/// configuration falls back to localhost only.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "invalid CORS origin, skipping");
                None
            }
        })
        .collect();

    let allowed = if parsed.is_empty() {
        tracing::info!("no CORS origins configured, allowing localhost only");
        vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5001"),
        ]
    } else {
        parsed
    };

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(..) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct LeadFilter {
    status: Option<String>,
}

async fn list_leads(
    State(state): State<AppState>,
    Query(filter): Query<LeadFilter>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let status = filter.status.as_deref().map(LeadStatus::parse);
    let leads = state.store.list_leads(status).map_err(|err| {
        tracing::error!(error = %err, "failed to list leads");
        store_status(&err)
    })?;
    Ok(Json(json!({ "leads": leads, "count": leads.len() })))
}

async fn create_lead(
    State(state): State<AppState>,
    Json(new): Json<NewLead>,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    if new.name.is_empty() || new.phone.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let existing = state.store.get_lead_by_phone(&new.phone).map_err(|err| {
        tracing::error!(error = %err, "lead lookup failed");
        store_status(&err)
    })?;
    if existing.is_some() {
        return Err(StatusCode::CONFLICT);
    }
    let id = state.store.create_lead(&new).map_err(|err| {
        tracing::error!(error = %err, "failed to create lead");
        store_status(&err)
    })?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let lead = state
        .store
        .get_lead(id)
        .map_err(|err| store_status(&err))?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({ "lead": lead })))
}

async fn update_lead(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<LeadUpdate>,
) -> Result<StatusCode, StatusCode> {
    state
        .store
        .update_lead(id, &update)
        .map_err(|err| store_status(&err))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_lead(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let deleted = state.store.delete_lead(id).map_err(|err| {
        tracing::error!(lead_id = id, error = %err, "failed to delete lead");
        store_status(&err)
    })?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Deserialize)]
struct QualifyRequest {
    qualification_status: String,
    uses_mobile_devices: Option<String>,
    employee_count: Option<i64>,
    notes: Option<String>,
}

/// Manual qualification from the dashboard, pushed on to the CRM
async fn qualify_lead(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<QualifyRequest>,
) -> Result<StatusCode, StatusCode> {
    let update = LeadUpdate {
        qualification_status: Some(Qualification::parse(&request.qualification_status)),
        uses_mobile_devices: request.uses_mobile_devices.as_deref().map(MobileUsage::parse),
        employee_count: request.employee_count,
        ..LeadUpdate::default()
    };
    state
        .store
        .update_lead(id, &update)
        .map_err(|err| store_status(&err))?;
    if let Some(notes) = request.notes.as_deref().filter(|n| !n.is_empty()) {
        state
            .store
            .append_note(id, notes)
            .map_err(|err| store_status(&err))?;
    }
    sync::spawn_qualification_sync(&state, id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct CallRequest {
    lead_id: i64,
}

async fn start_call(
    State(state): State<AppState>,
    Json(request): Json<CallRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let lock = state.lead_lock(request.lead_id);
    let _guard = lock.lock().await;

    let lead = state
        .store
        .get_lead(request.lead_id)
        .map_err(|err| store_status(&err))?
        .ok_or(StatusCode::NOT_FOUND)?;

    match calls::start_call(&state, &lead).await {
        Ok(sid) => Ok(Json(json!({ "lead_id": lead.id, "call_sid": sid }))),
        Err(CallError::Denied) => Err(StatusCode::FORBIDDEN),
        Err(CallError::Store(err)) => {
            tracing::error!(lead_id = lead.id, error = %err, "call store failure");
            Err(store_status(&err))
        }
        Err(CallError::Telephony(err)) => {
            tracing::error!(lead_id = lead.id, error = %err, "failed to place call");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

async fn call_logs(
    State(state): State<AppState>,
    Path(lead_id): Path<i64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let entries = state
        .store
        .call_log_for_lead(lead_id)
        .map_err(|err| store_status(&err))?;
    Ok(Json(json!({ "call_logs": entries, "count": entries.len() })))
}

#[derive(Debug, Deserialize)]
struct NewCallLogEntry {
    status: String,
    transcript: String,
}

/// Manual call-log annotation from the dashboard
async fn append_call_log(
    State(state): State<AppState>,
    Path(lead_id): Path<i64>,
    Json(entry): Json<NewCallLogEntry>,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    state
        .store
        .get_lead(lead_id)
        .map_err(|err| store_status(&err))?
        .ok_or(StatusCode::NOT_FOUND)?;
    let id = state
        .store
        .append_call_log(
            lead_id,
            leadcall_core::CallLogStatus::parse(&entry.status),
            &entry.transcript,
        )
        .map_err(|err| store_status(&err))?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn list_appointments(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let appointments = state
        .store
        .list_appointments()
        .map_err(|err| store_status(&err))?;
    Ok(Json(json!({ "appointments": appointments, "count": appointments.len() })))
}

#[derive(Debug, Deserialize)]
struct NewAppointment {
    lead_id: i64,
    date: String,
    time: String,
    #[serde(default)]
    medium: Option<String>,
}

async fn create_appointment(
    State(state): State<AppState>,
    Json(new): Json<NewAppointment>,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    let medium = new
        .medium
        .as_deref()
        .map(AppointmentMedium::parse)
        .unwrap_or_default();
    let id = state
        .store
        .create_appointment(new.lead_id, &new.date, &new.time, medium)
        .map_err(|err| store_status(&err))?;
    sync::spawn_appointment_sync(&state, id);
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<AppointmentUpdate>,
) -> Result<StatusCode, StatusCode> {
    state
        .store
        .update_appointment(id, &update)
        .map_err(|err| store_status(&err))?;
    sync::spawn_appointment_sync(&state, id);
    Ok(StatusCode::NO_CONTENT)
}

const AVAILABILITY_HOURS: std::ops::Range<u32> = 9..17;

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    date: String,
}

/// Whole-hour slots on a date not yet taken by a live appointment
async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let booked = state
        .store
        .booked_times_for_date(&query.date)
        .map_err(|err| store_status(&err))?;
    let available: Vec<String> = AVAILABILITY_HOURS
        .map(|hour| format!("{hour:02}:00"))
        .filter(|slot| !booked.contains(slot))
        .collect();
    Ok(Json(json!({ "date": query.date, "available": available })))
}

#[derive(Debug, Deserialize)]
struct FollowUpFilter {
    lead_id: Option<i64>,
}

async fn list_follow_ups(
    State(state): State<AppState>,
    Query(filter): Query<FollowUpFilter>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let follow_ups = state
        .store
        .list_follow_ups(filter.lead_id)
        .map_err(|err| store_status(&err))?;
    Ok(Json(json!({ "follow_ups": follow_ups, "count": follow_ups.len() })))
}

#[derive(Debug, Deserialize)]
struct FollowUpUpdate {
    status: String,
}

async fn update_follow_up(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<FollowUpUpdate>,
) -> Result<StatusCode, StatusCode> {
    state
        .store
        .update_follow_up_status(id, FollowUpStatus::parse(&update.status))
        .map_err(|err| store_status(&err))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Default)]
struct ScrapeRequest {
    location: Option<String>,
    industry: Option<String>,
    limit: Option<usize>,
}

/// Pull candidate leads from the business directory and insert the ones
/// whose phone number is new.
async fn scrape(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let location = request.location.unwrap_or_else(|| "Denver, CO".to_string());
    let industry = request.industry.unwrap_or_else(|| "Plumbing".to_string());
    let limit = request.limit.unwrap_or(30);

    let scraped = state
        .scraper
        .scrape(&location, &industry, limit)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "scrape failed");
            StatusCode::BAD_GATEWAY
        })?;

    let mut inserted = 0usize;
    for candidate in &scraped {
        let exists = state
            .store
            .get_lead_by_phone(&candidate.phone)
            .map_err(|err| store_status(&err))?
            .is_some();
        if exists {
            continue;
        }
        state
            .store
            .create_lead(&NewLead {
                name: candidate.name.clone(),
                phone: candidate.phone.clone(),
                category: candidate.category.clone(),
                industry: candidate.industry.clone(),
                address: candidate.address.clone(),
                website: candidate.website.clone(),
                city: candidate.city.clone(),
                state: candidate.state.clone(),
                employee_count: 0,
            })
            .map_err(|err| store_status(&err))?;
        inserted += 1;
    }

    Ok(Json(json!({
        "location": location,
        "industry": industry,
        "scraped": scraped.len(),
        "inserted": inserted,
        "dummy": state.scraper.is_dummy(),
    })))
}

/// Settings view with credentials reduced to configured flags
async fn get_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config_snapshot();
    Json(json!({
        "server": { "host": config.server.host, "port": config.server.port },
        "business_hours": config.business_hours,
        "test_mode": config.test_mode,
        "callback_url": config.callback_url,
        "sweep": config.sweep,
        "providers": {
            "twilio": config.twilio.is_configured(),
            "speech": config.speech.is_configured(),
            "llm": config.llm.is_configured(),
            "zoho": config.zoho.is_configured(),
            "scrape": config.scrape.is_configured(),
        },
    }))
}

#[derive(Debug, Deserialize)]
struct ConfigUpdate {
    test_mode: Option<bool>,
    callback_url: Option<String>,
    business_hours: Option<BusinessHoursConfig>,
}

/// Adjust the calling policy at runtime. Provider credentials are not
/// mutable here; those require a restart.
async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<ConfigUpdate>,
) -> Json<serde_json::Value> {
    {
        let mut config = state.config.write();
        if let Some(test_mode) = update.test_mode {
            config.test_mode = test_mode;
        }
        if let Some(callback_url) = update.callback_url {
            config.callback_url = callback_url;
        }
        if let Some(hours) = update.business_hours {
            config.business_hours = hours;
        }
    }
    tracing::info!("runtime configuration updated");
    get_config(State(state)).await
}
