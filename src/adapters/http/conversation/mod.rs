//! HTTP adapter for the conversation API.
//!
//! - `POST /conversations` - Start a conversation
//! - `POST /conversations/:id/messages` - Send an utterance
//! - `GET /conversations/:id` - Inspect a live conversation
//! - `DELETE /conversations/:id` - End a conversation

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ConversationView, ErrorResponse, SendMessageRequest, TurnResponse};
pub use handlers::ConversationAppState;
pub use routes::conversation_routes;
