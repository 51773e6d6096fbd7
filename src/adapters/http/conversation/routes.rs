//! Axum router configuration for the conversation API.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    end_conversation, get_conversation, send_message, start_conversation, ConversationAppState,
};

/// # Routes
/// - `POST /` - Start a conversation
/// - `GET /:id` - Inspect a conversation
/// - `DELETE /:id` - End a conversation
/// - `POST /:id/messages` - Send an utterance
pub fn conversation_routes() -> Router<ConversationAppState> {
    Router::new()
        .route("/", post(start_conversation))
        .route("/:id", get(get_conversation).delete(end_conversation))
        .route("/:id/messages", post(send_message))
}
