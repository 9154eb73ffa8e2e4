//! Conversation turns and the terminal-result classification type
//!
//! History is never held across requests: it is reconstructed from the
//! call log at the start of every turn, so the orchestrator stays
//! stateless between webhook deliveries.

use serde::{Deserialize, Serialize};

use crate::lead::MobileUsage;

/// Speaker role for a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// The bot's utterance
    Assistant,
    /// The lead's recognized speech
    User,
}

impl TurnRole {
    /// Transcript prefix used in call-log rows
    pub fn transcript_prefix(&self) -> &'static str {
        match self {
            Self::Assistant => "Bot: ",
            Self::User => "Lead: ",
        }
    }
}

/// One role-tagged utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: TurnRole::Assistant, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: TurnRole::User, content: content.into() }
    }

    /// Render as a call-log transcript line
    pub fn to_transcript(&self) -> String {
        format!("{}{}", self.role.transcript_prefix(), self.content)
    }

    /// Parse a call-log transcript line; `None` for system-event rows
    /// that carry no speaker prefix.
    pub fn from_transcript(transcript: &str) -> Option<Self> {
        if let Some(content) = transcript.strip_prefix("Bot: ") {
            Some(Self::assistant(content))
        } else if let Some(content) = transcript.strip_prefix("Lead: ") {
            Some(Self::user(content))
        } else {
            None
        }
    }
}

/// Reconstruct ordered conversation history from call-log transcripts.
///
/// Input must already be in creation order; rows without a speaker prefix
/// (status events, recording annotations) are skipped.
pub fn history_from_transcripts<'a, I>(transcripts: I) -> Vec<Turn>
where
    I: IntoIterator<Item = &'a str>,
{
    transcripts
        .into_iter()
        .filter_map(Turn::from_transcript)
        .collect()
}

/// Whether the dialogue has concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    #[default]
    Ongoing,
    Complete,
}

/// Structured classification of a conversation turn's outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConversationResult {
    pub status: ConversationStatus,
    pub appointment_set: bool,
    /// Set once the conversation yields a qualification signal
    pub qualified: Option<bool>,
    /// Best-effort extraction from the closing utterance; unset on
    /// extraction failure, never an error
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    /// Best-effort extraction from the lead's own utterances
    pub uses_mobile: Option<MobileUsage>,
    pub employee_count: Option<i64>,
}

impl ConversationResult {
    pub fn is_complete(&self) -> bool {
        self.status == ConversationStatus::Complete
    }
}
