//! In-Memory Conversation Store Adapter
//!
//! Holds live call contexts for the lifetime of the process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::conversation::ConversationContext;
use crate::domain::foundation::ConversationId;
use crate::ports::{ConversationStore, SharedContext, StoreError};

/// In-memory registry of conversation contexts
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    contexts: Arc<RwLock<HashMap<ConversationId, SharedContext>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every conversation (useful for tests)
    pub async fn clear(&self) {
        self.contexts.write().await.clear();
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn insert(&self, context: ConversationContext) -> Result<SharedContext, StoreError> {
        let id = context.conversation_id();
        let mut contexts = self.contexts.write().await;
        if contexts.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        let shared = Arc::new(Mutex::new(context));
        contexts.insert(id, Arc::clone(&shared));
        Ok(shared)
    }

    async fn get(&self, id: ConversationId) -> Result<Option<SharedContext>, StoreError> {
        Ok(self.contexts.read().await.get(&id).cloned())
    }

    async fn get_or_create(&self, id: ConversationId) -> Result<(SharedContext, bool), StoreError> {
        if let Some(existing) = self.contexts.read().await.get(&id) {
            return Ok((Arc::clone(existing), false));
        }

        // Re-check under the write lock; another turn may have created it.
        let mut contexts = self.contexts.write().await;
        if let Some(existing) = contexts.get(&id) {
            return Ok((Arc::clone(existing), false));
        }
        let shared = Arc::new(Mutex::new(ConversationContext::new(id)));
        contexts.insert(id, Arc::clone(&shared));
        Ok((shared, true))
    }

    async fn remove(&self, id: ConversationId) -> Result<bool, StoreError> {
        Ok(self.contexts.write().await.remove(&id).is_some())
    }

    async fn len(&self) -> usize {
        self.contexts.read().await.len()
    }
}
