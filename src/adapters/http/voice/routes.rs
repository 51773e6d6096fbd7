//! Axum router for telephony webhooks.

use axum::{routing::post, Router};

use super::handlers::{call_status, incoming_call, transcription, VoiceAppState};

/// # Routes
/// - `POST /incoming` - New call
/// - `POST /transcription` - Speech result for a gather
/// - `POST /status` - Call status callback
pub fn voice_routes() -> Router<VoiceAppState> {
    Router::new()
        .route("/incoming", post(incoming_call))
        .route("/transcription", post(transcription))
        .route("/status", post(call_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::classifier::KeywordIntentClassifier;
    use crate::adapters::helpdesk::InMemoryHelpdesk;
    use crate::adapters::knowledge_base::ArticleKnowledgeBase;
    use crate::adapters::storage::InMemoryConversationStore;
    use crate::application::flow::{responses, ConversationFlow, FlowSettings};
    use crate::adapters::http::voice::VoiceSettings;

    fn app() -> (Router, VoiceAppState) {
        let helpdesk = InMemoryHelpdesk::with_sample_articles();
        let flow = ConversationFlow::new(
            Arc::new(InMemoryConversationStore::new()),
            Arc::new(KeywordIntentClassifier::new()),
            Arc::new(ArticleKnowledgeBase::new(Arc::new(helpdesk.clone()))),
            Arc::new(helpdesk),
            FlowSettings::default(),
        );
        let state = VoiceAppState::new(Arc::new(flow), VoiceSettings::default());
        (voice_routes().with_state(state.clone()), state)
    }

    async fn post_form(router: &Router, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn incoming_call_greets_and_gathers() {
        let (router, state) = app();
        let (status, body) = post_form(&router, "/incoming", "CallSid=CA100").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(responses::GREETING));
        assert!(body.contains("<Gather"));
        assert!(body.contains("I didn't hear anything"));
        assert!(state.conversation_for("CA100").await.is_some());
    }

    #[tokio::test]
    async fn call_resolved_by_article_then_ended() {
        let (router, state) = app();
        post_form(&router, "/incoming", "CallSid=CA200").await;

        let (_, body) = post_form(
            &router,
            "/transcription",
            "CallSid=CA200&SpeechResult=I+forgot+my+password&Confidence=0.92",
        )
        .await;
        assert!(body.contains("Was this helpful?"));
        assert!(body.contains("<Gather"));

        let (_, body) = post_form(&router, "/transcription", "CallSid=CA200&SpeechResult=yes&Confidence=0.9").await;
        assert!(body.contains(responses::GLAD_TO_HELP));

        let (_, body) = post_form(&router, "/transcription", "CallSid=CA200&SpeechResult=no&Confidence=0.9").await;
        assert!(body.contains(responses::FAREWELL));
        assert!(body.contains("<Hangup/>"));
        assert!(!body.contains("<Gather"));

        let (status, _) = post_form(&router, "/status", "CallSid=CA200&CallStatus=completed").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.conversation_for("CA200").await.is_none());
        assert_eq!(state.flow.active_conversations().await, 0);
    }

    #[tokio::test]
    async fn transcription_for_unknown_call_starts_conversation() {
        let (router, state) = app();
        let (status, body) = post_form(
            &router,
            "/transcription",
            "CallSid=CA300&SpeechResult=my+bill+is+wrong&Confidence=0.8",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<Say"));
        assert!(state.conversation_for("CA300").await.is_some());
    }

    #[tokio::test]
    async fn missing_speech_is_reprompted() {
        let (router, _) = app();
        post_form(&router, "/incoming", "CallSid=CA400").await;
        let (_, body) = post_form(&router, "/transcription", "CallSid=CA400").await;
        assert!(body.contains("Could you please repeat it?"));
    }

    #[tokio::test]
    async fn non_terminal_status_keeps_conversation() {
        let (router, state) = app();
        post_form(&router, "/incoming", "CallSid=CA500").await;
        post_form(&router, "/status", "CallSid=CA500&CallStatus=in-progress").await;
        assert!(state.conversation_for("CA500").await.is_some());
    }
}
