//! Intent classification port.
//!
//! Maps one caller utterance to exactly one [`Intent`] plus any entities the
//! backing service detected. A label outside the closed intent set is a
//! [`ClassificationError`], never a silent `Unknown`.
//!
//! The recent context window is passed along so that short answers such as
//! "yes" can be read against the question the assistant just asked.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::{ContextEntry, Entity, Intent};

use super::AIError;

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        context: &[ContextEntry],
    ) -> Result<Classification, ClassificationError>;
}

/// Result of classifying an utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub intent: Intent,
    pub entities: Vec<Entity>,
}

impl Classification {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            entities: Vec::new(),
        }
    }

    pub fn with_entities(mut self, entities: Vec<Entity>) -> Self {
        self.entities = entities;
        self
    }

    /// Fallback used when classification fails.
    pub fn unknown() -> Self {
        Self::new(Intent::Unknown)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ClassificationError {
    /// The backing service call failed.
    #[error("classification backend failed: {0}")]
    Backend(#[from] AIError),

    /// The backend answered with something that is not valid JSON of the
    /// expected shape.
    #[error("unparseable classification response: {0}")]
    Unparseable(String),

    /// The backend returned a label outside the closed intent set.
    #[error("invalid intent label '{0}'")]
    InvalidIntent(String),
}

impl ClassificationError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassificationError::Backend(err) => err.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_has_no_entities() {
        let c = Classification::unknown();
        assert_eq!(c.intent, Intent::Unknown);
        assert!(c.entities.is_empty());
    }

    #[test]
    fn only_transient_backend_errors_retry() {
        assert!(ClassificationError::from(AIError::network("reset")).is_retryable());
        assert!(!ClassificationError::from(AIError::AuthenticationFailed).is_retryable());
        assert!(!ClassificationError::InvalidIntent("refund".into()).is_retryable());
    }
}
