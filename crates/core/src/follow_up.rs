//! Scheduled retry attempts for leads that did not book

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Follow-up lifecycle status; terminal once Completed or Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FollowUpStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl FollowUpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "In Progress" => Self::InProgress,
            "Completed" => Self::Completed,
            "Cancelled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// A scheduled retry for a lead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUp {
    pub id: i64,
    pub lead_id: i64,
    /// Absolute timestamp the retry becomes due
    pub scheduled_time: DateTime<Utc>,
    /// 1-10, higher is more urgent
    pub priority: u8,
    /// Free text explaining what triggered the retry
    pub reason: String,
    pub status: FollowUpStatus,
    pub created_at: DateTime<Utc>,
}
