//! Conversation Store Port - registry of live calls.
//!
//! Each context sits behind its own async mutex. Callers lock the context for
//! the whole turn, which serializes duplicate or out-of-order webhook
//! deliveries for one call without blocking any other call.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::conversation::ConversationContext;
use crate::domain::foundation::ConversationId;

/// A context shared between the registry and the turn currently holding it.
pub type SharedContext = Arc<Mutex<ConversationContext>>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Conversation already exists: {0}")]
    AlreadyExists(ConversationId),

    #[error("Conversation store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Registers a new context.
    ///
    /// # Errors
    /// Returns `StoreError::AlreadyExists` if the id is taken.
    async fn insert(&self, context: ConversationContext) -> Result<SharedContext, StoreError>;

    /// Looks up a live context.
    async fn get(&self, id: ConversationId) -> Result<Option<SharedContext>, StoreError>;

    /// Returns the context for `id`, creating an empty one if needed. The
    /// flag is true when the context was created by this call.
    async fn get_or_create(&self, id: ConversationId) -> Result<(SharedContext, bool), StoreError>;

    /// Drops a context. Returns false if it was not registered.
    async fn remove(&self, id: ConversationId) -> Result<bool, StoreError>;

    /// Number of live conversations.
    async fn len(&self) -> usize;
}
