//! Text-to-speech adapter
//!
//! Renders bot utterances through ElevenLabs into files the HTTP server
//! exposes under `/audio`, so the telephony gateway can `<Play>` them.
//! Synthesis is strictly best-effort: any provider failure degrades to
//! `Ok(None)` and the gateway's built-in voice reads the text instead.

mod elevenlabs;

pub use elevenlabs::{ElevenLabsSynthesizer, SpeechOptions};

use thiserror::Error;

/// Synthesis errors. These stay internal to the crate; the public trait
/// surface degrades them to `None` rather than bubbling them up.
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("speech network error: {0}")]
    Network(String),

    #[error("speech API error: {0}")]
    Api(String),

    #[error("audio write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        SpeechError::Network(err.to_string())
    }
}
