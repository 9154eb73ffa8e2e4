//! Page fetching through the BrightData web unlocker, with retry

use std::time::Duration;

use reqwest::Client;
use serde_json::json;

use crate::ScrapeError;

const API_URL: &str = "https://api.brightdata.com/request";

/// Retry policy for page fetches
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Fetches pages via the unlocker proxy; retries transient failures with
/// exponential backoff.
pub struct BrightDataFetcher {
    token: String,
    zone: String,
    settings: FetchSettings,
    client: Client,
}

impl BrightDataFetcher {
    pub fn new(token: impl Into<String>, zone: impl Into<String>, settings: FetchSettings) -> Self {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .unwrap_or_default();
        Self {
            token: token.into(),
            zone: zone.into(),
            settings,
            client,
        }
    }

    /// Fetch raw HTML for `url`, retrying transient failures
    pub async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let mut backoff = self.settings.initial_backoff;
        let mut last = String::new();

        for attempt in 1..=self.settings.max_attempts {
            match self.fetch_once(url).await {
                Ok(html) => return Ok(html),
                Err(err) => {
                    tracing::warn!(url, attempt, error = %err, "fetch attempt failed");
                    last = err.to_string();
                }
            }
            if attempt < self.settings.max_attempts {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        Err(ScrapeError::Exhausted {
            attempts: self.settings.max_attempts,
            last,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, ScrapeError> {
        let body = json!({
            "zone": self.zone,
            "url": url,
            "format": "raw",
        });

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Api(format!("HTTP {status}: {detail}")));
        }
        Ok(response.text().await?)
    }
}
