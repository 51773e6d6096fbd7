//! Helpdesk configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct HelpdeskConfig {
    #[serde(default)]
    pub provider: HelpdeskProvider,

    /// Kayako API root, e.g. `https://example.kayako.com/api/v1`
    pub base_url: Option<String>,

    pub email: Option<String>,

    pub password: Option<Secret<String>>,

    /// How long fetched articles are reused before listing again
    #[serde(default = "default_article_cache_ttl")]
    pub article_cache_ttl_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Where articles come from and tickets go.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HelpdeskProvider {
    Kayako,
    /// Bundled sample articles and process-local tickets
    #[default]
    InMemory,
}

/// Kayako credentials after validation.
#[derive(Debug, Clone, Copy)]
pub struct KayakoCredentials<'a> {
    pub base_url: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

impl HelpdeskConfig {
    pub fn article_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.article_cache_ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Kayako credentials, if all three are present and non-blank.
    pub fn kayako_credentials(&self) -> Option<KayakoCredentials<'_>> {
        let base_url = self.base_url.as_deref().filter(|s| !s.trim().is_empty())?;
        let email = self.email.as_deref().filter(|s| !s.trim().is_empty())?;
        let password = self
            .password
            .as_ref()
            .map(|p| p.expose_secret().as_str())
            .filter(|s| !s.is_empty())?;
        Some(KayakoCredentials {
            base_url,
            email,
            password,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("helpdesk.timeout_secs"));
        }
        if self.provider == HelpdeskProvider::Kayako {
            let Some(credentials) = self.kayako_credentials() else {
                return Err(ValidationError::MissingRequired(
                    "HELPDESK__BASE_URL, HELPDESK__EMAIL and HELPDESK__PASSWORD",
                ));
            };
            if !credentials.base_url.starts_with("https://")
                && !credentials.base_url.starts_with("http://")
            {
                return Err(ValidationError::InvalidHelpdeskUrl);
            }
        }
        Ok(())
    }
}

impl Default for HelpdeskConfig {
    fn default() -> Self {
        Self {
            provider: HelpdeskProvider::default(),
            base_url: None,
            email: None,
            password: None,
            article_cache_ttl_secs: default_article_cache_ttl(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_article_cache_ttl() -> u64 {
    300
}

fn default_timeout() -> u64 {
    15
}
