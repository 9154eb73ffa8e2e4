//! Application state
//!
//! Shared across all handlers and the sweep task. Provider clients are
//! built once from settings; the settings themselves sit behind a lock
//! so `POST /api/config` can adjust the calling policy at runtime.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use leadcall_config::Settings;
use leadcall_core::{Error, GenerateRequest, LanguageModel, Result, SpeechSynthesizer};
use leadcall_crm::{ZohoClient, ZohoCredentials};
use leadcall_llm::{OpenAiClient, OpenAiConfig};
use leadcall_scrape::LeadScraper;
use leadcall_speech::{ElevenLabsSynthesizer, SpeechOptions};
use leadcall_store::Store;
use leadcall_telephony::{TwilioClient, TwilioCredentials};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// Settings behind a lock so the config endpoint can mutate the
    /// calling policy without a restart
    pub config: Arc<RwLock<Settings>>,
    pub oracle: Arc<dyn LanguageModel>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub telephony: Arc<TwilioClient>,
    /// Absent when Zoho credentials are not configured
    pub crm: Option<Arc<ZohoClient>>,
    pub scraper: Arc<LeadScraper>,
    /// Per-lead write locks serializing webhook handling and sweep dials
    lead_locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl AppState {
    /// Build state with explicit oracle and speech backends. Tests use
    /// this to substitute scripted implementations.
    pub fn new(
        settings: Settings,
        store: Store,
        oracle: Arc<dyn LanguageModel>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let telephony = Arc::new(TwilioClient::new(TwilioCredentials {
            account_sid: settings.twilio.account_sid.clone(),
            auth_token: settings.twilio.auth_token.clone(),
            phone_number: settings.twilio.phone_number.clone(),
        }));
        let crm = settings.zoho.is_configured().then(|| {
            Arc::new(ZohoClient::new(ZohoCredentials {
                client_id: settings.zoho.client_id.clone(),
                client_secret: settings.zoho.client_secret.clone(),
                refresh_token: settings.zoho.refresh_token.clone(),
            }))
        });
        let scraper = Arc::new(LeadScraper::new(
            &settings.scrape.brightdata_token,
            &settings.scrape.unlocker_zone,
        ));

        Self {
            store,
            config: Arc::new(RwLock::new(settings)),
            oracle,
            speech,
            telephony,
            crm,
            scraper,
            lead_locks: Arc::new(DashMap::new()),
        }
    }

    /// Build every provider client from settings. Missing credentials
    /// switch the corresponding client into dummy or disabled mode.
    pub fn from_settings(settings: Settings, store: Store) -> Self {
        let oracle: Arc<dyn LanguageModel> = if settings.llm.is_configured() {
            let config = OpenAiConfig::new(settings.llm.api_key.clone())
                .with_endpoint(settings.llm.endpoint.clone())
                .with_model(settings.llm.model.clone())
                .with_timeout(std::time::Duration::from_secs(settings.llm.timeout_secs));
            match OpenAiClient::new(config) {
                Ok(client) => Arc::new(client),
                Err(err) => {
                    tracing::warn!(error = %err, "oracle client unavailable");
                    Arc::new(DisabledOracle)
                }
            }
        } else {
            tracing::info!("no oracle API key configured");
            Arc::new(DisabledOracle)
        };

        let speech = Arc::new(ElevenLabsSynthesizer::new(SpeechOptions::new(
            settings.speech.api_key.clone(),
            settings.speech.voice_id.clone(),
            settings.speech.output_dir.clone(),
            settings.callback_url.clone(),
        )));

        Self::new(settings, store, oracle, speech)
    }

    /// Snapshot of the current settings for use across await points
    pub fn config_snapshot(&self) -> Settings {
        self.config.read().clone()
    }

    /// The mutex serializing writes for one lead
    pub fn lead_lock(&self, lead_id: i64) -> Arc<Mutex<()>> {
        self.lead_locks
            .entry(lead_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Oracle stand-in when no API key is configured. Every request fails,
/// which the engine degrades to canned replies under test mode.
struct DisabledOracle;

#[async_trait::async_trait]
impl LanguageModel for DisabledOracle {
    async fn generate(&self, _request: GenerateRequest) -> Result<String> {
        Err(Error::Oracle("no oracle configured".to_string()))
    }
}
