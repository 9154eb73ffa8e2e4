//! Core domain types and collaborator traits for the leadcall pipeline
//!
//! This crate provides the foundational types used across all other crates:
//! - Lead, call-log, appointment and follow-up records
//! - Conversation turns and the terminal-result classification type
//! - Collaborator traits for pluggable backends (oracle, TTS)
//! - Error types

pub mod appointment;
pub mod call_log;
pub mod conversation;
pub mod error;
pub mod follow_up;
pub mod lead;
pub mod traits;

pub use appointment::{Appointment, AppointmentMedium, AppointmentStatus};
pub use call_log::{CallLogEntry, CallLogStatus};
pub use conversation::{
    history_from_transcripts, ConversationResult, ConversationStatus, Turn, TurnRole,
};
pub use error::{Error, Result};
pub use follow_up::{FollowUp, FollowUpStatus};
pub use lead::{Lead, LeadStatus, MobileUsage, Qualification};
pub use traits::{GenerateRequest, LanguageModel, SpeechSynthesizer, SynthesizedAudio};
