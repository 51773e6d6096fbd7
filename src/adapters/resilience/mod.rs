//! Resilience decorators for collaborator ports.

mod retry;

pub use retry::{
    RetryPolicy, RetryingAIProvider, RetryingClassifier, RetryingKnowledgeBase, RetryingTicketing,
};
