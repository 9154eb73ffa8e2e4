//! Collaborator traits for pluggable backends
//!
//! The conversation path touches exactly two external services per turn:
//! the text-generation oracle and the speech synthesizer. Both are
//! abstracted here so the engine and orchestrator can be tested against
//! fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::Turn;
use crate::error::Result;

/// A request to the text-generation oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Persona and method instructions
    pub system: String,
    /// Prior history plus the newest user turn, oldest first
    pub turns: Vec<Turn>,
}

/// The text-generation oracle. Treated as potentially slow or unavailable;
/// callers decide whether failures propagate or degrade.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String>;
}

/// A handle to synthesized audio the telephony gateway can play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedAudio {
    /// Publicly fetchable URL of the rendered audio
    pub url: String,
}

/// Text-to-speech adapter.
///
/// `Ok(None)` means the provider could not render the text and the caller
/// should fall back to the gateway's basic built-in voice.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Option<SynthesizedAudio>>;
}
