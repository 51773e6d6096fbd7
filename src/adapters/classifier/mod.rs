//! Intent classifier adapters.
//!
//! - `LlmIntentClassifier` - JSON classification through an `AIProvider`
//! - `KeywordIntentClassifier` - Offline keyword rules

mod keyword_classifier;
mod llm_classifier;

pub use keyword_classifier::KeywordIntentClassifier;
pub use llm_classifier::LlmIntentClassifier;
