//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the conversation flow and the outside world. Adapters implement these ports.
//!
//! ## Collaborator Ports
//!
//! - `IntentClassifier` - Utterance to intent and entities
//! - `KnowledgeBase` - Question to spoken answer, if one exists
//! - `ArticleSource` - Where knowledge-base articles come from
//! - `Ticketing` - Helpdesk that receives escalations
//! - `AIProvider` - LLM chat completions used by the classifier and knowledge base
//!
//! ## Infrastructure Ports
//!
//! - `ConversationStore` - Registry of live calls with per-call locking

mod ai_provider;
mod conversation_store;
mod intent_classifier;
mod knowledge_base;
mod ticketing;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, RequestMetadata, ResponseFormat, TokenUsage,
};
pub use conversation_store::{ConversationStore, SharedContext, StoreError};
pub use intent_classifier::{Classification, ClassificationError, IntentClassifier};
pub use knowledge_base::{Article, ArticleSource, KnowledgeBase, KnowledgeBaseError};
pub use ticketing::{Ticketing, TicketingError};
