//! Mock AI Provider for testing.
//!
//! Returns queued responses in order, records every request and can inject
//! errors, so classifier and knowledge-base code can be exercised
//! without calling a real model.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response(r#"{"intent": "password_reset", "entities": []}"#)
//!     .with_error(AIError::network("connection reset"));
//!
//! let response = provider.complete(request).await?;
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, TokenUsage,
};

const DEFAULT_CONTENT: &str = "Mock response";

/// Mock AI provider for testing.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Queued outcomes, consumed in order.
    responses: Arc<Mutex<VecDeque<Result<String, AIError>>>>,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a successful completion.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(Ok(content.into()));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: AIError) -> Self {
        self.push(Err(error));
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn push(&self, outcome: Result<String, AIError>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(outcome);
        }
    }

    fn next_outcome(&self) -> Result<String, AIError> {
        self.responses
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Ok(DEFAULT_CONTENT.to_string()))
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }

        let content = self.next_outcome()?;
        Ok(CompletionResponse {
            content,
            usage: TokenUsage::new(10, 20),
            model: "mock-model".to_string(),
            finish_reason: FinishReason::Stop,
        })
    }
}
