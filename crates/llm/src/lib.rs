//! Chat completion client for the conversation oracle
//!
//! Speaks the OpenAI chat-completions wire format, which also covers
//! compatible self-hosted endpoints. The client implements
//! [`leadcall_core::LanguageModel`] so the conversation engine never sees
//! provider details.

mod openai;

pub use openai::{OpenAiClient, OpenAiConfig};

use thiserror::Error;

/// Oracle client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("oracle configuration error: {0}")]
    Configuration(String),

    #[error("oracle network error: {0}")]
    Network(String),

    #[error("oracle API error: {0}")]
    Api(String),

    #[error("oracle returned an unusable response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for leadcall_core::Error {
    fn from(err: LlmError) -> Self {
        leadcall_core::Error::Oracle(err.to_string())
    }
}
