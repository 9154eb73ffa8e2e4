//! Appointments booked through a successful conversation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Appointment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Canceled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Canceled => "Canceled",
            Self::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Canceled" => Self::Canceled,
            "Completed" => Self::Completed,
            _ => Self::Scheduled,
        }
    }
}

/// Appointment medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AppointmentMedium {
    #[default]
    Phone,
    Video,
}

impl AppointmentMedium {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phone => "Phone",
            Self::Video => "Video",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Video" => Self::Video,
            _ => Self::Phone,
        }
    }
}

/// A scheduled meeting with a lead
///
/// The owning lead's denormalized `appointment_date`/`appointment_time`
/// fields must be kept consistent on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub lead_id: i64,
    pub date: String,
    pub time: String,
    pub medium: AppointmentMedium,
    pub status: AppointmentStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
