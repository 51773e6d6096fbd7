//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid timeout for {0}")]
    InvalidTimeout(&'static str),

    #[error("Invalid helpdesk URL format")]
    InvalidHelpdeskUrl,

    #[error("Retry max_attempts must be at least 1")]
    InvalidRetryAttempts,

    #[error("Retry initial backoff exceeds max backoff")]
    InvalidBackoff,

    #[error("{0} must be between 0 and 1")]
    OutOfRange(&'static str),

    #[error("Conversation context window must be at least 1")]
    InvalidContextWindow,
}
