//! Layered settings for the leadcall services
//!
//! Priority: environment variables (`LEADCALL_` prefix) over
//! `config/default.toml` over compiled-in defaults. There is no ambient
//! global configuration: callers load a `Settings` value once and pass the
//! relevant blocks down explicitly.

pub mod settings;

pub use settings::{
    load_settings, BusinessHoursConfig, DatabaseConfig, LlmSettings, ScrapeConfig, ServerConfig,
    Settings, SpeechConfig, SweepConfig, TwilioConfig, ZohoConfig,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
