//! Zoho CRM API client

use std::time::{Duration, Instant};

use chrono::{Duration as ChronoDuration, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use leadcall_core::{AppointmentMedium, Lead, MobileUsage, Qualification};

use crate::CrmError;

const TOKEN_URL: &str = "https://accounts.zoho.com/oauth/v2/token";
const API_BASE: &str = "https://www.zohoapis.com/crm/v2";

/// Access tokens last an hour; refresh a bit early
const TOKEN_TTL: Duration = Duration::from_secs(50 * 60);

const EVENT_MINUTES: i64 = 30;

/// OAuth credentials for the refresh-token grant
#[derive(Debug, Clone, Default)]
pub struct ZohoCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl ZohoCredentials {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty()
            && !self.client_secret.is_empty()
            && !self.refresh_token.is_empty()
    }
}

/// Zoho CRM client with a cached access token
pub struct ZohoClient {
    credentials: ZohoCredentials,
    client: Client,
    token: RwLock<Option<(String, Instant)>>,
}

impl ZohoClient {
    pub fn new(credentials: ZohoCredentials) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            credentials,
            client,
            token: RwLock::new(None),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_configured()
    }

    async fn access_token(&self) -> Result<String, CrmError> {
        if !self.is_configured() {
            return Err(CrmError::Unconfigured);
        }

        if let Some((token, fetched)) = self.token.read().await.as_ref() {
            if fetched.elapsed() < TOKEN_TTL {
                return Ok(token.clone());
            }
        }

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("refresh_token", self.credentials.refresh_token.as_str()),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrmError::Api(format!("token refresh HTTP {status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CrmError::InvalidResponse(e.to_string()))?;

        let mut cache = self.token.write().await;
        *cache = Some((token.access_token.clone(), Instant::now()));
        Ok(token.access_token)
    }

    async fn post_record(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<String, CrmError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .post(format!("{API_BASE}/{path}"))
            .header("Authorization", format!("Zoho-oauthtoken {token}"))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrmError::Api(format!("HTTP {status}: {body}")));
        }

        let created: RecordResponse = response
            .json()
            .await
            .map_err(|e| CrmError::InvalidResponse(e.to_string()))?;
        created
            .data
            .into_iter()
            .next()
            .map(|r| r.details.id)
            .ok_or_else(|| CrmError::InvalidResponse("empty record response".to_string()))
    }

    async fn put_record(&self, path: &str, payload: serde_json::Value) -> Result<(), CrmError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .put(format!("{API_BASE}/{path}"))
            .header("Authorization", format!("Zoho-oauthtoken {token}"))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrmError::Api(format!("HTTP {status}: {body}")));
        }
        Ok(())
    }

    /// Push a lead as a Zoho Lead record; returns the CRM id
    pub async fn create_lead(&self, lead: &Lead) -> Result<String, CrmError> {
        let industry = lead.industry_context().unwrap_or("");
        let payload = json!({
            "data": [{
                "Company": lead.name,
                "Phone": lead.phone,
                "Industry": industry,
                "Address": lead.address,
                "Website": lead.website,
                "City": lead.city,
                "State": lead.state,
                "Description": format!("Employee Count: {}", lead.employee_count),
                "Lead_Source": "AI Assistant",
            }]
        });
        self.post_record("Leads", payload).await
    }

    /// Create a calendar event for an appointment; returns the event id
    pub async fn create_event(
        &self,
        lead: &Lead,
        date: &str,
        time: &str,
        medium: AppointmentMedium,
        zoho_lead_id: Option<&str>,
    ) -> Result<String, CrmError> {
        let (start, end) = event_window(date, time);
        let mut record = json!({
            "Subject": format!("Meeting with {}", lead.name),
            "Start_DateTime": start,
            "End_DateTime": end,
            "Event_Title": format!("Mobile Solutions Consultation with {}", lead.name),
            "Location": location_for(medium),
        });
        if let Some(id) = zoho_lead_id {
            record["What_Id"] = json!(id);
            record["$se_module"] = json!("Leads");
        }
        self.post_record("Events", json!({ "data": [record] })).await
    }

    /// Move an existing calendar event to a new slot
    pub async fn update_event(
        &self,
        event_id: &str,
        date: &str,
        time: &str,
        medium: AppointmentMedium,
    ) -> Result<(), CrmError> {
        let (start, end) = event_window(date, time);
        let payload = json!({
            "data": [{
                "Start_DateTime": start,
                "End_DateTime": end,
                "Location": location_for(medium),
            }]
        });
        self.put_record(&format!("Events/{event_id}"), payload).await
    }

    /// Push qualification results onto the linked Zoho lead
    pub async fn update_lead_qualification(
        &self,
        zoho_lead_id: &str,
        qualification: Qualification,
        uses_mobile: MobileUsage,
        employee_count: i64,
        notes: &str,
    ) -> Result<(), CrmError> {
        let lead_status = match qualification {
            Qualification::Qualified => "Qualified",
            _ => "Not Qualified",
        };
        let payload = json!({
            "data": [{
                "Description": format!(
                    "Employee Count: {employee_count}\nUses Mobile Devices: {}\n\n{notes}",
                    uses_mobile.as_str(),
                ),
                "Lead_Status": lead_status,
                "$se_module": "Leads",
            }]
        });
        self.put_record(&format!("Leads/{zoho_lead_id}"), payload).await
    }
}

fn location_for(medium: AppointmentMedium) -> &'static str {
    match medium {
        AppointmentMedium::Phone => "Phone Call",
        AppointmentMedium::Video => "Zoom Meeting",
    }
}

/// Event start/end strings for a date and `HH:MM` time; a malformed time
/// yields a zero-length event at the raw strings rather than an error.
fn event_window(date: &str, time: &str) -> (String, String) {
    let start = format!("{date}T{time}:00");
    let end = NaiveDateTime::parse_from_str(&start, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| {
            (dt + ChronoDuration::minutes(EVENT_MINUTES))
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|_| start.clone());
    (start, end)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    data: Vec<RecordEntry>,
}

#[derive(Debug, Deserialize)]
struct RecordEntry {
    details: RecordDetails,
}

#[derive(Debug, Deserialize)]
struct RecordDetails {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_window_adds_thirty_minutes() {
        let (start, end) = event_window("2026-09-01", "15:30");
        assert_eq!(start, "2026-09-01T15:30:00");
        assert_eq!(end, "2026-09-01T16:00:00");
    }

    #[test]
    fn malformed_time_degrades_to_a_zero_length_event() {
        let (start, end) = event_window("2026-09-01", "mid-afternoon");
        assert_eq!(start, end);
    }

    #[tokio::test]
    async fn unconfigured_client_refuses_to_push() {
        let client = ZohoClient::new(ZohoCredentials::default());
        assert!(!client.is_configured());
        let err = client.access_token().await.unwrap_err();
        assert!(matches!(err, CrmError::Unconfigured));
    }

    #[test]
    fn record_response_parses_the_created_id() {
        let json = r#"{"data":[{"code":"SUCCESS","details":{"id":"4829130000012345"}}]}"#;
        let parsed: RecordResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data[0].details.id, "4829130000012345");
    }
}
