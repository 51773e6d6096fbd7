//! HTTP adapter for telephony webhooks.
//!
//! Twilio-compatible form posts in, TwiML out:
//! - `POST /voice/incoming` - Greet the caller and start listening
//! - `POST /voice/transcription` - Run a turn on recognized speech
//! - `POST /voice/status` - End the conversation when the call ends

pub mod dto;
mod handlers;
mod routes;
mod twiml;

pub use handlers::{VoiceAppState, VoiceSettings};
pub use routes::voice_routes;
pub use twiml::VoiceResponse;
