//! Telephony webhook payloads (Twilio form posts).

use serde::Deserialize;

/// `POST /voice/incoming`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IncomingCallForm {
    pub call_sid: String,
}

/// `POST /voice/transcription`
///
/// Confidence arrives as text and may be blank, so it is parsed leniently.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TranscriptionForm {
    pub call_sid: String,
    #[serde(default)]
    pub speech_result: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
}

impl TranscriptionForm {
    pub fn transcript(&self) -> &str {
        self.speech_result.as_deref().unwrap_or_default()
    }

    /// Missing or unparsable confidence counts as fully confident.
    pub fn confidence(&self) -> f32 {
        self.confidence
            .as_deref()
            .and_then(|c| c.trim().parse::<f32>().ok())
            .filter(|c| c.is_finite())
            .unwrap_or(1.0)
    }
}

/// `POST /voice/status`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallStatusForm {
    pub call_sid: String,
    pub call_status: String,
}

impl CallStatusForm {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.call_status.as_str(),
            "completed" | "busy" | "failed" | "no-answer" | "canceled"
        )
    }
}
