//! Shared error type

use thiserror::Error;

/// Top-level error for cross-crate propagation
#[derive(Error, Debug)]
pub enum Error {
    #[error("store error: {0}")]
    Store(String),

    #[error("oracle error: {0}")]
    Oracle(String),

    #[error("speech error: {0}")]
    Speech(String),

    #[error("telephony error: {0}")]
    Telephony(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("conversation error: {0}")]
    Conversation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
