//! HTTP adapters.
//!
//! - `voice` - Telephony webhooks speaking TwiML
//! - `conversation` - JSON API over the same conversation flow
//!
//! [`create_router`] assembles both behind request tracing and a timeout.

pub mod conversation;
pub mod voice;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::flow::ConversationFlow;

pub use conversation::{conversation_routes, ConversationAppState};
pub use voice::{voice_routes, VoiceAppState, VoiceSettings};

/// Builds the full application router.
///
/// # Routes
/// - `GET /health`
/// - `/voice/*` - telephony webhooks
/// - `/conversations/*` - JSON conversation API
pub fn create_router(
    flow: Arc<ConversationFlow>,
    voice_settings: VoiceSettings,
    request_timeout: Duration,
) -> Router {
    let voice_state = VoiceAppState::new(flow.clone(), voice_settings);
    let conversation_state = ConversationAppState::new(flow.clone());

    Router::new()
        .route("/health", get(health_check))
        .with_state(flow)
        .nest("/voice", voice_routes().with_state(voice_state))
        .nest("/conversations", conversation_routes().with_state(conversation_state))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
}

/// Liveness plus knowledge-base readiness.
async fn health_check(State(flow): State<Arc<ConversationFlow>>) -> impl IntoResponse {
    let knowledge_base = match flow.knowledge_base_status() {
        Some(true) => "ready",
        Some(false) => "unavailable",
        None => "pending",
    };

    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "activeConversations": flow.active_conversations().await,
        "knowledgeBase": knowledge_base,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::classifier::KeywordIntentClassifier;
    use crate::adapters::helpdesk::InMemoryHelpdesk;
    use crate::adapters::knowledge_base::ArticleKnowledgeBase;
    use crate::adapters::storage::InMemoryConversationStore;
    use crate::application::flow::FlowSettings;

    fn flow() -> Arc<ConversationFlow> {
        let helpdesk = InMemoryHelpdesk::with_sample_articles();
        Arc::new(ConversationFlow::new(
            Arc::new(InMemoryConversationStore::new()),
            Arc::new(KeywordIntentClassifier::new()),
            Arc::new(ArticleKnowledgeBase::new(Arc::new(helpdesk.clone()))),
            Arc::new(helpdesk),
            FlowSettings::default(),
        ))
    }

    async fn health(router: Router) -> serde_json::Value {
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_pending_then_ready() {
        let flow = flow();
        let router = create_router(flow.clone(), VoiceSettings::default(), Duration::from_secs(5));

        let body = health(router.clone()).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["knowledgeBase"], "pending");
        assert_eq!(body["activeConversations"], 0);

        assert!(flow.knowledge_base_ready().await);
        flow.start_conversation().await.unwrap();

        let body = health(router).await;
        assert_eq!(body["knowledgeBase"], "ready");
        assert_eq!(body["activeConversations"], 1);
    }

    #[tokio::test]
    async fn mounts_voice_and_conversation_routes() {
        let router = create_router(flow(), VoiceSettings::default(), Duration::from_secs(5));

        let response = router
            .clone()
            .oneshot(Request::post("/conversations").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router
            .oneshot(
                Request::post("/voice/incoming")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("CallSid=CA123"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
