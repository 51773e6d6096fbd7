//! Storage Adapters
//!
//! Implementations of the ConversationStore port. Conversations live only as
//! long as the process; there is no durable backend.

mod in_memory_conversation_store;

pub use in_memory_conversation_store::InMemoryConversationStore;
