//! Lead records and their lifecycle enums

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lead lifecycle status
///
/// Transitions only move forward along the call lifecycle, except that a
/// fresh call attempt always resets the lead back to `Calling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LeadStatus {
    #[default]
    NotCalled,
    Calling,
    CallAttempted,
    Completed,
    AppointmentSet,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotCalled => "Not Called",
            Self::Calling => "Calling",
            Self::CallAttempted => "Call Attempted",
            Self::Completed => "Completed",
            Self::AppointmentSet => "Appointment Set",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Calling" => Self::Calling,
            "Call Attempted" => Self::CallAttempted,
            "Completed" => Self::Completed,
            "Appointment Set" => Self::AppointmentSet,
            _ => Self::NotCalled,
        }
    }
}

/// Qualification outcome for a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Qualification {
    #[default]
    Unknown,
    Qualified,
    NotQualified,
}

impl Qualification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Qualified => "Qualified",
            Self::NotQualified => "Not Qualified",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Qualified" => Self::Qualified,
            "Not Qualified" => Self::NotQualified,
            _ => Self::Unknown,
        }
    }
}

/// Whether a lead's field crews use mobile devices (tri-state)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MobileUsage {
    Yes,
    No,
    #[default]
    Unknown,
}

impl MobileUsage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
            Self::Unknown => "Unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Yes" => Self::Yes,
            "No" => Self::No,
            _ => Self::Unknown,
        }
    }
}

/// A prospective customer tracked through the calling pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    /// Phone number, used as the dedup/lookup key
    pub phone: String,
    pub category: String,
    pub industry: String,
    pub address: String,
    pub website: String,
    pub city: String,
    pub state: String,
    /// Headcount used for qualification tiering; 0 means unknown
    pub employee_count: i64,
    pub uses_mobile_devices: MobileUsage,
    pub status: LeadStatus,
    pub qualification_status: Qualification,
    /// Append-only log of system-generated annotations
    pub notes: String,
    /// Denormalized copy of the latest appointment
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Industry context for the conversation prompt: the industry field,
    /// falling back to the category field, else none.
    pub fn industry_context(&self) -> Option<&str> {
        if !self.industry.is_empty() {
            Some(&self.industry)
        } else if !self.category.is_empty() {
            Some(&self.category)
        } else {
            None
        }
    }

    /// First name of the contact, for the opening script
    pub fn contact_first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("there")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            LeadStatus::NotCalled,
            LeadStatus::Calling,
            LeadStatus::CallAttempted,
            LeadStatus::Completed,
            LeadStatus::AppointmentSet,
        ] {
            assert_eq!(LeadStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn unknown_status_string_defaults_to_not_called() {
        assert_eq!(LeadStatus::parse("garbage"), LeadStatus::NotCalled);
        assert_eq!(MobileUsage::parse("maybe"), MobileUsage::Unknown);
        assert_eq!(Qualification::parse(""), Qualification::Unknown);
    }

    fn lead_with(industry: &str, category: &str) -> Lead {
        Lead {
            id: 1,
            name: "Acme Construction".into(),
            phone: "555-1234".into(),
            category: category.into(),
            industry: industry.into(),
            address: String::new(),
            website: String::new(),
            city: "Denver".into(),
            state: "CO".into(),
            employee_count: 0,
            uses_mobile_devices: MobileUsage::Unknown,
            status: LeadStatus::NotCalled,
            qualification_status: Qualification::Unknown,
            notes: String::new(),
            appointment_date: None,
            appointment_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn industry_context_falls_back_to_category() {
        assert_eq!(lead_with("Plumbing", "Trades").industry_context(), Some("Plumbing"));
        assert_eq!(lead_with("", "Trades").industry_context(), Some("Trades"));
        assert_eq!(lead_with("", "").industry_context(), None);
    }

    #[test]
    fn contact_first_name_handles_empty_names() {
        assert_eq!(lead_with("", "").contact_first_name(), "Acme");
        let mut lead = lead_with("", "");
        lead.name = String::new();
        assert_eq!(lead.contact_first_name(), "there");
    }
}
