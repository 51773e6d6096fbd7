//! Conversation domain module.
//!
//! Per-call conversational state: the state machine, caller intents and
//! entities, message history and the contact-information extractor.

mod contact;
mod context;
mod entity;
mod intent;
mod message;
mod state;

pub use contact::{extract_contact_info, normalize_spoken, ContactInfo, HISTORY_WINDOW};
pub use context::ConversationContext;
pub use entity::{Entity, EMAIL_ENTITY, PHONE_ENTITY};
pub use intent::Intent;
pub use message::{ContextEntry, Message, MessageRole};
pub use state::{ConversationState, FlowEvent};
