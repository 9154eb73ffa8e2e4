//! Shared fixtures for handler tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};

use leadcall_config::Settings;
use leadcall_core::{
    Error, GenerateRequest, LanguageModel, Result, SpeechSynthesizer, SynthesizedAudio,
};
use leadcall_store::{NewLead, Store};

use crate::state::AppState;

/// Oracle that replays a fixed list of replies
pub(crate) struct ScriptedOracle {
    replies: Mutex<Vec<Result<String>>>,
}

impl ScriptedOracle {
    pub(crate) fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies),
        }
    }
}

#[async_trait]
impl LanguageModel for ScriptedOracle {
    async fn generate(&self, _request: GenerateRequest) -> Result<String> {
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(Error::Oracle("script exhausted".into()));
        }
        replies.remove(0)
    }
}

/// Speech backend that always falls back to the gateway voice
pub(crate) struct SilentSpeech;

#[async_trait]
impl SpeechSynthesizer for SilentSpeech {
    async fn synthesize(&self, _text: &str) -> Result<Option<SynthesizedAudio>> {
        Ok(None)
    }
}

/// Settings whose calling window always admits, without test mode
pub(crate) fn always_open_settings() -> Settings {
    let mut settings = Settings::default();
    settings.business_hours.weekday_start = "00:00".into();
    settings.business_hours.weekday_end = "23:59".into();
    settings.business_hours.weekend_enabled = true;
    settings.business_hours.weekend_start = "00:00".into();
    settings.business_hours.weekend_end = "23:59".into();
    settings
}

/// Settings whose calling window never admits
pub(crate) fn always_closed_settings() -> Settings {
    let mut settings = Settings::default();
    settings.business_hours.weekday_start = "00:00".into();
    settings.business_hours.weekday_end = "00:00".into();
    settings.business_hours.weekend_enabled = false;
    settings
}

pub(crate) fn state_with(settings: Settings, replies: Vec<Result<String>>) -> AppState {
    AppState::new(
        settings,
        Store::open_in_memory().unwrap(),
        Arc::new(ScriptedOracle::new(replies)),
        Arc::new(SilentSpeech),
    )
}

/// State with an always-open window and the given oracle script
pub(crate) fn test_state(replies: Vec<Result<String>>) -> AppState {
    state_with(always_open_settings(), replies)
}

pub(crate) fn seed_lead(store: &Store) -> i64 {
    store
        .create_lead(&NewLead {
            name: "Peak Plumbing".into(),
            phone: "555-7000".into(),
            industry: "Plumbing".into(),
            city: "Denver".into(),
            state: "CO".into(),
            employee_count: 12,
            ..NewLead::default()
        })
        .unwrap()
}

pub(crate) fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub(crate) async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
