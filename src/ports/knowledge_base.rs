//! Knowledge-base ports.
//!
//! [`KnowledgeBase`] is the single capability the conversation flow consumes:
//! turn a caller's question into a short spoken answer, or nothing.
//! [`ArticleSource`] is where a knowledge base gets its articles from (a
//! helpdesk API or an in-memory catalogue).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Loads whatever the knowledge base needs before the first search.
    async fn initialize(&self) -> Result<(), KnowledgeBaseError>;

    /// Returns a voice-ready summary of the most relevant article, or `None`
    /// when nothing is relevant enough.
    async fn search_and_summarize(&self, query: &str) -> Result<Option<String>, KnowledgeBaseError>;
}

#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn list_articles(&self) -> Result<Vec<Article>, KnowledgeBaseError>;
}

/// A help-center article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum KnowledgeBaseError {
    #[error("knowledge base is not initialized")]
    NotInitialized,

    #[error("knowledge base unavailable: {0}")]
    Unavailable(String),

    #[error("article source failed: {0}")]
    Source(String),
}

impl KnowledgeBaseError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            KnowledgeBaseError::Unavailable(_) | KnowledgeBaseError::Source(_) => true,
            KnowledgeBaseError::NotInitialized => false,
        }
    }
}
