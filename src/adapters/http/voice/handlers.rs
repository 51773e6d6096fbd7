//! Telephony webhook handlers.
//!
//! Each call is identified by its CallSid. The handlers keep a CallSid to
//! conversation id map and translate every turn into TwiML.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Form, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::application::flow::{responses, ConversationFlow};
use crate::domain::foundation::ConversationId;

use super::dto::{CallStatusForm, IncomingCallForm, TranscriptionForm};
use super::twiml::VoiceResponse;

/// How the assistant sounds and where the telephony provider posts speech.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    pub voice: String,
    pub language: String,
    pub speech_timeout: String,
    /// Spoken inside the first gather.
    pub gather_prompt: String,
    /// Spoken when the caller says nothing before the gather times out.
    pub no_input_message: String,
    /// Absolute base for callback URLs; relative paths are used when unset.
    pub public_base_url: Option<String>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice: "Polly.Joanna".to_string(),
            language: "en-US".to_string(),
            speech_timeout: "auto".to_string(),
            gather_prompt: "Please speak after the tone.".to_string(),
            no_input_message: "I didn't hear anything. Please call back and try again."
                .to_string(),
            public_base_url: None,
        }
    }
}

impl VoiceSettings {
    pub fn transcription_url(&self) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/voice/transcription", base.trim_end_matches('/')),
            None => "/voice/transcription".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct VoiceAppState {
    pub flow: Arc<ConversationFlow>,
    pub settings: Arc<VoiceSettings>,
    calls: Arc<RwLock<HashMap<String, ConversationId>>>,
}

impl VoiceAppState {
    pub fn new(flow: Arc<ConversationFlow>, settings: VoiceSettings) -> Self {
        Self {
            flow,
            settings: Arc::new(settings),
            calls: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn conversation_for(&self, call_sid: &str) -> Option<ConversationId> {
        self.calls.read().await.get(call_sid).copied()
    }

    /// Starts a conversation for the call and remembers the mapping.
    async fn start_call(&self, call_sid: &str) -> Option<(ConversationId, String)> {
        match self.flow.start_conversation().await {
            Ok((conversation_id, greeting)) => {
                self.calls
                    .write()
                    .await
                    .insert(call_sid.to_string(), conversation_id);
                Some((conversation_id, greeting))
            }
            Err(err) => {
                error!(call_sid, error = %err, "Could not start conversation");
                None
            }
        }
    }

    fn twiml(&self, response: VoiceResponse) -> Response {
        (
            [(header::CONTENT_TYPE, "text/xml")],
            response.render(&self.settings),
        )
            .into_response()
    }
}

/// POST /voice/incoming - Answer a call with the greeting and start listening
pub async fn incoming_call(
    State(state): State<VoiceAppState>,
    Form(form): Form<IncomingCallForm>,
) -> Response {
    let Some((conversation_id, greeting)) = state.start_call(&form.call_sid).await else {
        return state.twiml(VoiceResponse::new().say(responses::APOLOGY).hangup());
    };
    info!(call_sid = %form.call_sid, %conversation_id, "Incoming call");

    state.twiml(
        VoiceResponse::new()
            .say(greeting)
            .gather(Some(state.settings.gather_prompt.clone()))
            .say(state.settings.no_input_message.clone())
            .hangup(),
    )
}

/// POST /voice/transcription - Run one turn on the caller's speech
pub async fn transcription(
    State(state): State<VoiceAppState>,
    Form(form): Form<TranscriptionForm>,
) -> Response {
    let conversation_id = match state.conversation_for(&form.call_sid).await {
        Some(id) => id,
        None => match state.start_call(&form.call_sid).await {
            Some((id, _)) => id,
            None => return state.twiml(VoiceResponse::new().say(responses::APOLOGY).hangup()),
        },
    };

    let outcome = state
        .flow
        .handle_turn(conversation_id, form.transcript(), form.confidence())
        .await;

    let response = VoiceResponse::new().say(outcome.response);
    let response = if outcome.call_should_end {
        info!(call_sid = %form.call_sid, %conversation_id, "Conversation concluded, hanging up");
        response.hangup()
    } else {
        response
            .gather(None)
            .say(state.settings.no_input_message.clone())
            .hangup()
    };
    state.twiml(response)
}

/// POST /voice/status - Release the conversation once the call is over
pub async fn call_status(
    State(state): State<VoiceAppState>,
    Form(form): Form<CallStatusForm>,
) -> StatusCode {
    if !form.is_terminal() {
        return StatusCode::NO_CONTENT;
    }

    let removed = state.calls.write().await.remove(&form.call_sid);
    if let Some(conversation_id) = removed {
        if let Err(err) = state.flow.end_conversation(conversation_id).await {
            error!(call_sid = %form.call_sid, %conversation_id, error = %err, "Could not end conversation");
        }
        info!(call_sid = %form.call_sid, status = %form.call_status, "Call finished");
    }
    StatusCode::NO_CONTENT
}
