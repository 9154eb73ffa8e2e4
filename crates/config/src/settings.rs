//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Calling-hours policy consumed by the admission gate
    #[serde(default)]
    pub business_hours: BusinessHoursConfig,

    /// Test/override mode: admission always allows, oracle failures
    /// degrade to canned replies, providers run in dummy mode
    #[serde(default)]
    pub test_mode: bool,

    /// Public base URL Twilio calls back into (e.g. an ngrok tunnel)
    #[serde(default = "default_callback_url")]
    pub callback_url: String,

    #[serde(default)]
    pub twilio: TwilioConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub zoho: ZohoConfig,

    #[serde(default)]
    pub scrape: ScrapeConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub sweep: SweepConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            business_hours: BusinessHoursConfig::default(),
            test_mode: false,
            callback_url: default_callback_url(),
            twilio: TwilioConfig::default(),
            speech: SpeechConfig::default(),
            llm: LlmSettings::default(),
            zoho: ZohoConfig::default(),
            scrape: ScrapeConfig::default(),
            database: DatabaseConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins; empty means localhost only
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_callback_url() -> String {
    "http://localhost:5001".to_string()
}

/// Business-hours block consumed by the call admission gate.
///
/// Time bounds are `HH:MM` strings; malformed values degrade to these
/// defaults inside the gate rather than failing configuration load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessHoursConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_weekday_start")]
    pub weekday_start: String,
    #[serde(default = "default_weekday_end")]
    pub weekday_end: String,
    #[serde(default)]
    pub weekend_enabled: bool,
    #[serde(default = "default_weekend_start")]
    pub weekend_start: String,
    #[serde(default = "default_weekend_end")]
    pub weekend_end: String,
}

impl Default for BusinessHoursConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            weekday_start: default_weekday_start(),
            weekday_end: default_weekday_end(),
            weekend_enabled: false,
            weekend_start: default_weekend_start(),
            weekend_end: default_weekend_end(),
        }
    }
}

fn default_timezone() -> String {
    "US/Mountain".to_string()
}

fn default_weekday_start() -> String {
    "09:30".to_string()
}

fn default_weekday_end() -> String {
    "16:00".to_string()
}

fn default_weekend_start() -> String {
    "10:00".to_string()
}

fn default_weekend_end() -> String {
    "14:00".to_string()
}

/// Twilio credentials; missing values switch the gateway to dummy mode
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub phone_number: String,
}

impl TwilioConfig {
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty() && !self.phone_number.is_empty()
    }
}

/// ElevenLabs credentials; missing key means fall back to `<Say>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub voice_id: String,
    /// Directory rendered audio lands in, served under `/audio`
    #[serde(default = "default_audio_dir")]
    pub output_dir: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            voice_id: String::new(),
            output_dir: default_audio_dir(),
        }
    }
}

fn default_audio_dir() -> String {
    "audio".to_string()
}

impl SpeechConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Text-generation oracle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: String::new(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl LlmSettings {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    30
}

/// Zoho CRM credentials; missing values disable the sink entirely
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ZohoConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub refresh_token: String,
}

impl ZohoConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.refresh_token.is_empty()
    }
}

/// BrightData scraping settings; missing token means dummy leads
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScrapeConfig {
    #[serde(default)]
    pub brightdata_token: String,
    #[serde(default)]
    pub unlocker_zone: String,
}

impl ScrapeConfig {
    pub fn is_configured(&self) -> bool {
        !self.brightdata_token.is_empty()
    }
}

/// SQLite settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_max_size: default_pool_max_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_db_path() -> String {
    "leadcall.db".to_string()
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Due-follow-up sweep settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_sweep_enabled")]
    pub enabled: bool,
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,
    /// Maximum leads dialed per sweep pass
    #[serde(default = "default_sweep_batch_size")]
    pub batch_size: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: default_sweep_enabled(),
            interval_secs: default_sweep_interval_secs(),
            batch_size: default_sweep_batch_size(),
        }
    }
}

fn default_sweep_enabled() -> bool {
    true
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_sweep_batch_size() -> usize {
    10
}

impl Settings {
    /// Validate settings that cannot be checked lazily
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        if self.database.pool_max_size == 0 {
            return Err(ConfigError::Invalid(
                "database.pool_max_size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Load settings from `config/default.toml` (when present) and the
/// environment. Environment keys use `LEADCALL_` with `__` separators,
/// e.g. `LEADCALL_BUSINESS_HOURS__TIMEZONE`.
pub fn load_settings(config_dir: Option<&str>) -> Result<Settings, ConfigError> {
    let dir = config_dir.unwrap_or("config");
    let default_path = format!("{dir}/default.toml");

    let mut builder = Config::builder();
    if Path::new(&default_path).exists() {
        builder = builder.add_source(File::with_name(&default_path));
    }
    let config = builder
        .add_source(Environment::with_prefix("LEADCALL").separator("__"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}
