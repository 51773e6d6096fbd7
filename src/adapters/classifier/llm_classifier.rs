//! Intent classifier backed by a chat-completion model.
//!
//! The model is asked for a JSON object `{"intent": ..., "entities": [...]}`.
//! The intent label is parsed strictly against the closed intent set;
//! anything else is a `ClassificationError`.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::domain::conversation::{ContextEntry, Entity, Intent, MessageRole};
use crate::ports::{
    AIProvider, Classification, ClassificationError, CompletionRequest, IntentClassifier,
    RequestMetadata,
};

const CLASSIFIER_PROMPT: &str = r#"You detect intents for a phone-based customer support assistant.
Read the caller's latest utterance, using the earlier turns only as context, and return:

1. "intent": exactly one of
   "general_query"     general questions, or a support question that fits nothing below
   "password_reset"    forgotten, expired or broken passwords
   "billing_issue"     invoices, charges, payments, refunds, subscriptions
   "technical_problem" errors, crashes, features not working
   "account_access"    cannot sign in or reach the account, not password related
   "confirm"           yes, that helped, agreement
   "deny"              no, that did not help, disagreement
   "end_conversation"  goodbye, nothing else needed
   "unknown"           none of the above

2. "entities": facts worth remembering (name, email, phone, account number, order number),
   each as {"type": "...", "value": "...", "confidence": 0.0-1.0}

Respond with a single JSON object, for example:
{"intent": "account_access", "entities": []}"#;

pub struct LlmIntentClassifier {
    provider: Arc<dyn AIProvider>,
}

impl LlmIntentClassifier {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self { provider }
    }
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    intent: String,
    #[serde(default)]
    entities: Vec<RawEntity>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(rename = "type")]
    entity_type: String,
    value: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

/// Parses the model's JSON answer.
pub(crate) fn parse_classification(content: &str) -> Result<Classification, ClassificationError> {
    let raw: RawClassification = serde_json::from_str(content.trim())
        .map_err(|e| ClassificationError::Unparseable(e.to_string()))?;

    let intent: Intent = raw
        .intent
        .parse()
        .map_err(|_| ClassificationError::InvalidIntent(raw.intent.clone()))?;

    let entities = raw
        .entities
        .into_iter()
        .filter_map(|e| match Entity::new(e.entity_type, e.value, e.confidence) {
            Ok(entity) => Some(entity),
            Err(err) => {
                debug!(error = %err, "Dropping malformed entity from classifier");
                None
            }
        })
        .collect();

    Ok(Classification::new(intent).with_entities(entities))
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(
        &self,
        text: &str,
        context: &[ContextEntry],
    ) -> Result<Classification, ClassificationError> {
        let history: Vec<ContextEntry> = context
            .iter()
            .filter(|e| e.role != MessageRole::System)
            .cloned()
            .collect();

        let request = CompletionRequest::new(RequestMetadata::new("classify_intent"))
            .with_system_prompt(CLASSIFIER_PROMPT)
            .with_context(history)
            .with_message(MessageRole::User, text)
            .with_temperature(0.0)
            .with_max_tokens(200)
            .json();

        let response = self.provider.complete(request).await?;
        let classification = parse_classification(&response.content)?;
        debug!(intent = %classification.intent, entities = classification.entities.len(), "Classified utterance");
        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::ports::AIError;

    #[test]
    fn parses_intent_and_entities() {
        let c = parse_classification(
            r#"{"intent":"billing_issue","entities":[{"type":"account_id","value":"42","confidence":0.9}]}"#,
        )
        .unwrap();
        assert_eq!(c.intent, Intent::BillingIssue);
        assert_eq!(c.entities[0].value(), "42");
    }

    #[test]
    fn missing_entities_default_to_empty() {
        let c = parse_classification(r#"{"intent":"confirm"}"#).unwrap();
        assert_eq!(c.intent, Intent::Confirm);
        assert!(c.entities.is_empty());
    }

    #[test]
    fn label_outside_closed_set_is_invalid_intent() {
        let err = parse_classification(r#"{"intent":"refund_request","entities":[]}"#).unwrap_err();
        assert!(matches!(err, ClassificationError::InvalidIntent(ref label) if label == "refund_request"));
    }

    #[test]
    fn non_json_is_unparseable() {
        let err = parse_classification("The intent is billing").unwrap_err();
        assert!(matches!(err, ClassificationError::Unparseable(_)));
    }

    #[test]
    fn out_of_range_entity_is_dropped() {
        let c = parse_classification(
            r#"{"intent":"general_query","entities":[{"type":"name","value":"Ann","confidence":7}]}"#,
        )
        .unwrap();
        assert!(c.entities.is_empty());
    }

    #[tokio::test]
    async fn sends_history_without_system_entries() {
        let provider = MockAIProvider::new().with_response(r#"{"intent":"deny","entities":[]}"#);
        let classifier = LlmIntentClassifier::new(Arc::new(provider.clone()));
        let context = vec![
            ContextEntry::system("persona"),
            ContextEntry {
                role: MessageRole::Assistant,
                content: "Was this helpful?".to_string(),
            },
        ];

        let c = classifier.classify("no", &context).await.unwrap();

        assert_eq!(c.intent, Intent::Deny);
        let call = &provider.get_calls()[0];
        assert_eq!(call.system_prompt.as_deref(), Some(CLASSIFIER_PROMPT));
        assert_eq!(call.messages.len(), 2);
        assert_eq!(call.messages[0].content, "Was this helpful?");
        assert_eq!(call.messages[1].content, "no");
    }

    #[tokio::test]
    async fn provider_failure_is_backend_error() {
        let provider = MockAIProvider::new().with_error(AIError::network("reset"));
        let classifier = LlmIntentClassifier::new(Arc::new(provider));
        let err = classifier.classify("hello", &[]).await.unwrap_err();
        assert!(matches!(err, ClassificationError::Backend(_)));
        assert!(err.is_retryable());
    }
}
