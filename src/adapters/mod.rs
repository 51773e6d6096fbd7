//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the conversation flow to external systems:
//! - `ai` - LLM providers (OpenAI, mock)
//! - `classifier` - Intent classifiers (LLM-backed, keyword rules)
//! - `helpdesk` - Article sources and ticketing (Kayako, in-memory)
//! - `knowledge_base` - Article search and spoken summaries
//! - `resilience` - Retry decorators around any port
//! - `storage` - Live conversation registry
//! - `http` - Telephony webhooks and JSON API

pub mod ai;
pub mod classifier;
pub mod helpdesk;
pub mod http;
pub mod knowledge_base;
pub mod resilience;
pub mod storage;
