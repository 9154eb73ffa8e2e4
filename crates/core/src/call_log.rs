//! Call-log entries: one row per conversational turn or system event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status tag on a call-log entry
///
/// Covers both our own lifecycle tags and the raw provider status codes
/// delivered by status callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallLogStatus {
    Started,
    InProgress,
    Completed,
    Failed,
    AmdDetection,
    Recording,
    /// Raw provider status code ("busy", "no-answer", ...)
    Provider(String),
}

impl CallLogStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Started => "Started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::AmdDetection => "AMD Detection",
            Self::Recording => "Recording",
            Self::Provider(code) => code,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Started" => Self::Started,
            "In Progress" => Self::InProgress,
            "Completed" => Self::Completed,
            "Failed" => Self::Failed,
            "AMD Detection" => Self::AmdDetection,
            "Recording" => Self::Recording,
            other => Self::Provider(other.to_string()),
        }
    }

    /// True for the statuses that mark a call as currently in flight
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Started | Self::InProgress)
    }
}

/// One conversational turn or system event for a lead
///
/// Entries are immutable once written, with one designed exception:
/// recording URLs may be appended to the latest open entry's transcript.
/// `created_at` is the sole ordering key used to reconstruct conversation
/// history, strictly increasing per lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLogEntry {
    pub id: i64,
    pub lead_id: i64,
    pub status: CallLogStatus,
    /// Transcript prefixed by speaker role (`Bot: ` or `Lead: `) for
    /// conversational turns; free text for system events.
    pub transcript: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_codes_survive_parsing() {
        assert_eq!(
            CallLogStatus::parse("no-answer"),
            CallLogStatus::Provider("no-answer".into())
        );
        assert_eq!(CallLogStatus::parse("no-answer").as_str(), "no-answer");
    }

    #[test]
    fn only_started_and_in_progress_are_active() {
        assert!(CallLogStatus::Started.is_active());
        assert!(CallLogStatus::InProgress.is_active());
        assert!(!CallLogStatus::Completed.is_active());
        assert!(!CallLogStatus::Failed.is_active());
        assert!(!CallLogStatus::Provider("busy".into()).is_active());
    }
}
