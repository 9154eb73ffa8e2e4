//! Twilio outbound-call gateway
//!
//! Three pieces: a REST client that originates calls, a TwiML builder
//! for webhook responses, and typed payloads for the webhook forms
//! Twilio posts back. Without credentials the client runs in dummy mode,
//! returning synthetic call SIDs so the rest of the pipeline can be
//! exercised end to end.

mod client;
mod twiml;
mod webhook;

pub use client::{OutboundCall, TwilioClient, TwilioCredentials};
pub use twiml::TwimlBuilder;
pub use webhook::{
    AmdWebhook, RecordingWebhook, ResponseWebhook, StatusWebhook, VoiceWebhook,
};

use thiserror::Error;

/// Gateway errors
#[derive(Error, Debug)]
pub enum TelephonyError {
    #[error("telephony network error: {0}")]
    Network(String),

    #[error("telephony API error: {0}")]
    Api(String),

    #[error("telephony returned an unusable response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for TelephonyError {
    fn from(err: reqwest::Error) -> Self {
        TelephonyError::Network(err.to_string())
    }
}

impl From<TelephonyError> for leadcall_core::Error {
    fn from(err: TelephonyError) -> Self {
        leadcall_core::Error::Telephony(err.to_string())
    }
}
