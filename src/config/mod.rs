//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `VOICE_HELPDESK` prefix
//! and nested values are separated by double underscores. Every section has
//! defaults, so an empty environment yields a runnable offline service.
//!
//! # Example
//!
//! ```no_run
//! use voice_helpdesk::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod error;
mod flow;
mod helpdesk;
mod retry;
mod server;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use flow::{FlowConfig, VoiceConfig};
pub use helpdesk::{HelpdeskConfig, HelpdeskProvider, KayakoCredentials};
pub use retry::RetryConfig;
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

use crate::adapters::http::VoiceSettings;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM provider for classification and summaries
    #[serde(default)]
    pub ai: AiConfig,

    /// Article source and ticketing backend
    #[serde(default)]
    pub helpdesk: HelpdeskConfig,

    /// Retry policy for collaborator calls
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub flow: FlowConfig,

    #[serde(default)]
    pub voice: VoiceConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `VOICE_HELPDESK` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `VOICE_HELPDESK__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `VOICE_HELPDESK__HELPDESK__PROVIDER=kayako` -> `helpdesk.provider = kayako`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("VOICE_HELPDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.helpdesk.validate()?;
        self.retry.validate()?;
        self.flow.validate()?;
        Ok(())
    }

    pub fn voice_settings(&self) -> VoiceSettings {
        self.voice.settings(self.server.public_base_url.as_deref())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 7] = [
        "VOICE_HELPDESK__SERVER__PORT",
        "VOICE_HELPDESK__SERVER__ENVIRONMENT",
        "VOICE_HELPDESK__SERVER__LOG_FORMAT",
        "VOICE_HELPDESK__HELPDESK__PROVIDER",
        "VOICE_HELPDESK__AI__OPENAI_API_KEY",
        "VOICE_HELPDESK__FLOW__MIN_TRANSCRIPT_CONFIDENCE",
        "VOICE_HELPDESK__RETRY__MAX_ATTEMPTS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.helpdesk.provider, HelpdeskProvider::InMemory);
        assert!(!config.ai.has_openai());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("VOICE_HELPDESK__SERVER__PORT", "3000");
        env::set_var("VOICE_HELPDESK__SERVER__LOG_FORMAT", "json");
        env::set_var("VOICE_HELPDESK__AI__OPENAI_API_KEY", "sk-test");
        env::set_var("VOICE_HELPDESK__FLOW__MIN_TRANSCRIPT_CONFIDENCE", "0.5");
        env::set_var("VOICE_HELPDESK__RETRY__MAX_ATTEMPTS", "5");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.ai.openai_key(), Some("sk-test"));
        assert_eq!(config.flow.min_transcript_confidence, 0.5);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_kayako_without_credentials_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("VOICE_HELPDESK__HELPDESK__PROVIDER", "kayako");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.helpdesk.provider, HelpdeskProvider::Kayako);
        assert!(matches!(config.validate(), Err(ValidationError::MissingRequired(_))));
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("VOICE_HELPDESK__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }
}
