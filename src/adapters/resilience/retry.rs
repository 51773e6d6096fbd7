//! Retry with exponential backoff, and decorators that apply it to each
//! collaborator port.
//!
//! Only errors whose `is_retryable()` is true are retried. The caller's own
//! timeout still bounds the whole sequence of attempts.

use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::domain::conversation::ContextEntry;
use crate::domain::foundation::TicketId;
use crate::domain::ticket::NewTicket;
use crate::ports::{
    AIError, AIProvider, Classification, ClassificationError, CompletionRequest,
    CompletionResponse, IntentClassifier, KnowledgeBase, KnowledgeBaseError, Ticketing,
    TicketingError,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero behaves like one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.saturating_sub(1) as i32);
        let millis = (self.initial_backoff.as_millis() as f64 * factor).round();
        Duration::from_millis(millis.min(u64::MAX as f64) as u64).min(self.max_backoff)
    }

    /// Runs `call` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation: &str,
        retryable: impl Fn(&E) -> bool,
        mut call: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < attempts && retryable(&err) => {
                    let delay = self.backoff_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

pub struct RetryingClassifier {
    inner: Arc<dyn IntentClassifier>,
    policy: RetryPolicy,
}

impl RetryingClassifier {
    pub fn new(inner: Arc<dyn IntentClassifier>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl IntentClassifier for RetryingClassifier {
    async fn classify(
        &self,
        text: &str,
        context: &[ContextEntry],
    ) -> Result<Classification, ClassificationError> {
        self.policy
            .run("classify", ClassificationError::is_retryable, || {
                self.inner.classify(text, context)
            })
            .await
    }
}

pub struct RetryingKnowledgeBase {
    inner: Arc<dyn KnowledgeBase>,
    policy: RetryPolicy,
}

impl RetryingKnowledgeBase {
    pub fn new(inner: Arc<dyn KnowledgeBase>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl KnowledgeBase for RetryingKnowledgeBase {
    async fn initialize(&self) -> Result<(), KnowledgeBaseError> {
        self.policy
            .run("kb_initialize", KnowledgeBaseError::is_retryable, || {
                self.inner.initialize()
            })
            .await
    }

    async fn search_and_summarize(&self, query: &str) -> Result<Option<String>, KnowledgeBaseError> {
        self.policy
            .run("kb_search", KnowledgeBaseError::is_retryable, || {
                self.inner.search_and_summarize(query)
            })
            .await
    }
}

pub struct RetryingTicketing {
    inner: Arc<dyn Ticketing>,
    policy: RetryPolicy,
}

impl RetryingTicketing {
    pub fn new(inner: Arc<dyn Ticketing>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl Ticketing for RetryingTicketing {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<TicketId, TicketingError> {
        self.policy
            .run("create_ticket", TicketingError::is_retryable, || {
                self.inner.create_ticket(ticket.clone())
            })
            .await
    }
}

pub struct RetryingAIProvider {
    inner: Arc<dyn AIProvider>,
    policy: RetryPolicy,
}

impl RetryingAIProvider {
    pub fn new(inner: Arc<dyn AIProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl AIProvider for RetryingAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        self.policy
            .run("ai_complete", AIError::is_retryable, || {
                self.inner.complete(request.clone())
            })
            .await
    }
}
