//! Twilio REST client for originating calls

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::TelephonyError;

const API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Account credentials; empty fields switch the client to dummy mode
#[derive(Debug, Clone, Default)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    /// Caller ID for outbound calls
    pub phone_number: String,
}

impl TwilioCredentials {
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty() && !self.phone_number.is_empty()
    }
}

/// Parameters for one outbound call. All URLs must be publicly reachable
/// by Twilio, so they are built from the configured callback base.
#[derive(Debug, Clone)]
pub struct OutboundCall {
    pub to: String,
    /// TwiML webhook invoked when the call connects
    pub voice_url: String,
    pub status_callback_url: String,
    /// Async answering-machine detection result webhook
    pub amd_callback_url: String,
    pub recording_callback_url: String,
}

/// Client for the Calls endpoint
pub struct TwilioClient {
    credentials: TwilioCredentials,
    client: Client,
    api_base: String,
}

impl TwilioClient {
    pub fn new(credentials: TwilioCredentials) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            credentials,
            client,
            api_base: API_BASE.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_configured()
    }

    /// Originate an outbound call and return its call SID.
    ///
    /// In dummy mode no network traffic happens; a synthetic SID is
    /// returned so callers can exercise the webhook flow by hand.
    pub async fn place_call(&self, call: &OutboundCall) -> Result<String, TelephonyError> {
        if !self.is_configured() {
            let sid = format!("dummy-{}", Uuid::new_v4());
            tracing::info!(to = %call.to, %sid, "telephony in dummy mode, call not placed");
            return Ok(sid);
        }

        let params = [
            ("To", call.to.as_str()),
            ("From", self.credentials.phone_number.as_str()),
            ("Url", call.voice_url.as_str()),
            ("StatusCallback", call.status_callback_url.as_str()),
            ("StatusCallbackEvent", "initiated ringing answered completed"),
            ("MachineDetection", "Enable"),
            ("AsyncAmd", "true"),
            ("AsyncAmdStatusCallback", call.amd_callback_url.as_str()),
            ("Record", "true"),
            ("RecordingStatusCallback", call.recording_callback_url.as_str()),
        ];

        let response = self
            .client
            .post(format!(
                "{}/Accounts/{}/Calls.json",
                self.api_base, self.credentials.account_sid
            ))
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelephonyError::Api(format!("HTTP {status}: {body}")));
        }

        let created: CallCreated = response
            .json()
            .await
            .map_err(|e| TelephonyError::InvalidResponse(e.to_string()))?;
        tracing::info!(to = %call.to, sid = %created.sid, "outbound call placed");
        Ok(created.sid)
    }
}

#[derive(Debug, Deserialize)]
struct CallCreated {
    sid: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outbound() -> OutboundCall {
        OutboundCall {
            to: "+13035551234".into(),
            voice_url: "http://localhost:5001/webhook/voice?lead_id=1".into(),
            status_callback_url: "http://localhost:5001/webhook/status?lead_id=1".into(),
            amd_callback_url: "http://localhost:5001/webhook/amd?lead_id=1".into(),
            recording_callback_url: "http://localhost:5001/webhook/recording?lead_id=1".into(),
        }
    }

    #[tokio::test]
    async fn dummy_mode_returns_synthetic_sid() {
        let client = TwilioClient::new(TwilioCredentials::default());
        assert!(!client.is_configured());
        let sid = client.place_call(&outbound()).await.unwrap();
        assert!(sid.starts_with("dummy-"));
    }

    #[tokio::test]
    async fn dummy_sids_are_unique() {
        let client = TwilioClient::new(TwilioCredentials::default());
        let a = client.place_call(&outbound()).await.unwrap();
        let b = client.place_call(&outbound()).await.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn partial_credentials_do_not_count_as_configured() {
        let creds = TwilioCredentials {
            account_sid: "AC123".into(),
            ..TwilioCredentials::default()
        };
        assert!(!creds.is_configured());
    }
}
