//! Conversation flow and voice configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::http::VoiceSettings;
use crate::adapters::knowledge_base::DEFAULT_RELEVANCE_THRESHOLD;
use crate::application::flow::FlowSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    /// Upper bound on one classifier, knowledge-base or helpdesk call
    #[serde(default = "default_collaborator_timeout")]
    pub collaborator_timeout_secs: u64,

    #[serde(default = "default_min_transcript_confidence")]
    pub min_transcript_confidence: f32,

    /// History messages handed to the classifier
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    #[serde(default = "default_kb_relevance_threshold")]
    pub kb_relevance_threshold: f64,

    #[serde(default = "default_ticket_subject")]
    pub ticket_subject: String,
}

impl FlowConfig {
    pub fn settings(&self) -> FlowSettings {
        FlowSettings {
            collaborator_timeout: Duration::from_secs(self.collaborator_timeout_secs),
            min_transcript_confidence: self.min_transcript_confidence,
            context_window: self.context_window,
            ticket_subject: self.ticket_subject.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.collaborator_timeout_secs == 0 || self.collaborator_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout("flow.collaborator_timeout_secs"));
        }
        if !(0.0..=1.0).contains(&self.min_transcript_confidence) {
            return Err(ValidationError::OutOfRange("flow.min_transcript_confidence"));
        }
        if !(0.0..=1.0).contains(&self.kb_relevance_threshold) {
            return Err(ValidationError::OutOfRange("flow.kb_relevance_threshold"));
        }
        if self.context_window == 0 {
            return Err(ValidationError::InvalidContextWindow);
        }
        if self.ticket_subject.trim().is_empty() {
            return Err(ValidationError::MissingRequired("FLOW__TICKET_SUBJECT"));
        }
        Ok(())
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout_secs: default_collaborator_timeout(),
            min_transcript_confidence: default_min_transcript_confidence(),
            context_window: default_context_window(),
            kb_relevance_threshold: default_kb_relevance_threshold(),
            ticket_subject: default_ticket_subject(),
        }
    }
}

/// Voice and prompt settings for the telephony webhooks.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_speech_timeout")]
    pub speech_timeout: String,

    pub gather_prompt: Option<String>,

    pub no_input_message: Option<String>,
}

impl VoiceConfig {
    /// Builds webhook settings, taking callback URLs from the server's public base.
    pub fn settings(&self, public_base_url: Option<&str>) -> VoiceSettings {
        let defaults = VoiceSettings::default();
        VoiceSettings {
            voice: self.voice.clone(),
            language: self.language.clone(),
            speech_timeout: self.speech_timeout.clone(),
            gather_prompt: self.gather_prompt.clone().unwrap_or(defaults.gather_prompt),
            no_input_message: self
                .no_input_message
                .clone()
                .unwrap_or(defaults.no_input_message),
            public_base_url: public_base_url.map(str::to_string),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            language: default_language(),
            speech_timeout: default_speech_timeout(),
            gather_prompt: None,
            no_input_message: None,
        }
    }
}

fn default_collaborator_timeout() -> u64 {
    10
}

fn default_min_transcript_confidence() -> f32 {
    0.3
}

fn default_context_window() -> usize {
    10
}

fn default_kb_relevance_threshold() -> f64 {
    DEFAULT_RELEVANCE_THRESHOLD
}

fn default_ticket_subject() -> String {
    "Voice support request".to_string()
}

fn default_voice() -> String {
    "Polly.Joanna".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_speech_timeout() -> String {
    "auto".to_string()
}
