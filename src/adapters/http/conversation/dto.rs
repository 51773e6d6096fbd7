//! HTTP DTOs for the conversation API.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::application::flow::TurnOutcome;
use crate::domain::conversation::{ConversationContext, ConversationState, Intent, Message, MessageRole};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /conversations/:id/messages`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub text: String,
    /// Speech-to-text confidence; typed input is fully confident.
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationResponse {
    pub conversation_id: String,
    pub greeting: String,
    pub state: ConversationState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub conversation_id: String,
    pub response: String,
    pub state: ConversationState,
    pub call_should_end: bool,
}

impl From<TurnOutcome> for TurnResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            conversation_id: outcome.conversation_id.to_string(),
            response: outcome.response,
            state: outcome.state,
            call_should_end: outcome.call_should_end,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            timestamp: message.timestamp.to_rfc3339(),
            intent: message.intent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView {
    pub value: String,
    pub confidence: f64,
}

/// Full view of a live conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: String,
    pub state: ConversationState,
    pub messages: Vec<MessageView>,
    pub entities: BTreeMap<String, EntityView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_intent: Option<Intent>,
    pub metadata: BTreeMap<String, String>,
    pub created_at: String,
}

impl From<&ConversationContext> for ConversationView {
    fn from(context: &ConversationContext) -> Self {
        Self {
            id: context.conversation_id().to_string(),
            state: context.current_state(),
            messages: context.messages().iter().map(MessageView::from).collect(),
            entities: context
                .detected_entities()
                .iter()
                .map(|(kind, entity)| {
                    (
                        kind.clone(),
                        EntityView {
                            value: entity.value().to_string(),
                            confidence: entity.confidence(),
                        },
                    )
                })
                .collect(),
            last_intent: context.last_intent(),
            metadata: context.metadata().clone(),
            created_at: context.created_at().to_rfc3339(),
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        Self::new("NOT_FOUND", format!("{} not found: {}", resource, id))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{Entity, EMAIL_ENTITY};
    use crate::domain::foundation::ConversationId;

    #[test]
    fn send_message_defaults_confidence() {
        let request: SendMessageRequest = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(request.confidence, 1.0);
    }

    #[test]
    fn conversation_view_serializes_camel_case() {
        let mut context = ConversationContext::new(ConversationId::new());
        let email = Entity::new(EMAIL_ENTITY, "ann@example.com", 0.9).unwrap();
        context.add_message(MessageRole::User, "ann@example.com", Some(Intent::Unknown), vec![email]);

        let json = serde_json::to_value(ConversationView::from(&context)).unwrap();

        assert_eq!(json["state"], "greeting");
        assert_eq!(json["lastIntent"], "unknown");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["entities"]["email"]["value"], "ann@example.com");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn not_found_error_names_resource() {
        let error = ErrorResponse::not_found("Conversation", "abc");
        assert_eq!(error.error_code, "NOT_FOUND");
        assert_eq!(error.message, "Conversation not found: abc");
    }
}
