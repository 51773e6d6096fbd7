//! HTTP handlers for the conversation API.
//!
//! A JSON front door onto the same flow the telephony webhooks drive, used
//! for text channels and for exercising the assistant without a phone.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::flow::ConversationFlow;
use crate::domain::conversation::ConversationState;
use crate::domain::foundation::ConversationId;

use super::dto::{
    ConversationView, ErrorResponse, SendMessageRequest, StartConversationResponse, TurnResponse,
};

/// Shared application state for conversation handlers.
#[derive(Clone)]
pub struct ConversationAppState {
    pub flow: Arc<ConversationFlow>,
}

impl ConversationAppState {
    pub fn new(flow: Arc<ConversationFlow>) -> Self {
        Self { flow }
    }
}

fn parse_id(raw: &str) -> Result<ConversationId, ConversationApiError> {
    raw.parse()
        .map_err(|_| ConversationApiError::BadRequest("Invalid conversation ID format".to_string()))
}

/// POST /conversations - Start a conversation.
pub async fn start_conversation(
    State(state): State<ConversationAppState>,
) -> Result<impl IntoResponse, ConversationApiError> {
    let (conversation_id, greeting) = state
        .flow
        .start_conversation()
        .await
        .map_err(|e| ConversationApiError::Internal(e.to_string()))?;

    let body = StartConversationResponse {
        conversation_id: conversation_id.to_string(),
        greeting,
        state: ConversationState::CollectingIssue,
    };
    Ok((StatusCode::CREATED, Json(body)))
}

/// POST /conversations/:id/messages - Run one turn.
///
/// An unknown id starts a fresh conversation under that id.
///
/// # Errors
/// - 400 Bad Request: Malformed conversation id
pub async fn send_message(
    State(state): State<ConversationAppState>,
    Path(conversation_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ConversationApiError> {
    let conversation_id = parse_id(&conversation_id)?;
    let outcome = state
        .flow
        .handle_turn(conversation_id, &request.text, request.confidence)
        .await;
    Ok((StatusCode::OK, Json(TurnResponse::from(outcome))))
}

/// GET /conversations/:id - Inspect a live conversation.
///
/// # Errors
/// - 400 Bad Request: Malformed conversation id
/// - 404 Not Found: No live conversation with that id
pub async fn get_conversation(
    State(state): State<ConversationAppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ConversationApiError> {
    let conversation_id = parse_id(&raw_id)?;
    let context = state
        .flow
        .snapshot(conversation_id)
        .await
        .map_err(|e| ConversationApiError::Internal(e.to_string()))?
        .ok_or_else(|| ConversationApiError::NotFound("Conversation".to_string(), raw_id))?;

    Ok((StatusCode::OK, Json(ConversationView::from(&context))))
}

/// DELETE /conversations/:id - End a conversation.
///
/// # Errors
/// - 400 Bad Request: Malformed conversation id
/// - 404 Not Found: No live conversation with that id
pub async fn end_conversation(
    State(state): State<ConversationAppState>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ConversationApiError> {
    let conversation_id = parse_id(&raw_id)?;
    let removed = state
        .flow
        .end_conversation(conversation_id)
        .await
        .map_err(|e| ConversationApiError::Internal(e.to_string()))?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ConversationApiError::NotFound("Conversation".to_string(), raw_id))
    }
}

/// Errors surfaced by the conversation API.
#[derive(Debug)]
pub enum ConversationApiError {
    BadRequest(String),
    NotFound(String, String),
    Internal(String),
}

impl IntoResponse for ConversationApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ConversationApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg))
            }
            ConversationApiError::NotFound(resource, id) => {
                (StatusCode::NOT_FOUND, ErrorResponse::not_found(&resource, &id))
            }
            ConversationApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::internal("An internal error occurred"))
            }
        };

        (status, Json(error)).into_response()
    }
}
