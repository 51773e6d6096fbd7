//! End-to-end tests for the support call flow.
//!
//! These tests drive the assembled service through its public surfaces:
//! 1. Telephony webhooks (form posts in, TwiML out)
//! 2. The JSON conversation API
//! 3. The flow directly, with the LLM-backed classifier on a mock provider

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use voice_helpdesk::adapters::ai::MockAIProvider;
use voice_helpdesk::adapters::classifier::{KeywordIntentClassifier, LlmIntentClassifier};
use voice_helpdesk::adapters::helpdesk::InMemoryHelpdesk;
use voice_helpdesk::adapters::http::{create_router, VoiceSettings};
use voice_helpdesk::adapters::knowledge_base::ArticleKnowledgeBase;
use voice_helpdesk::adapters::resilience::{RetryPolicy, RetryingClassifier, RetryingTicketing};
use voice_helpdesk::adapters::storage::InMemoryConversationStore;
use voice_helpdesk::application::flow::responses;
use voice_helpdesk::application::{ConversationFlow, FlowSettings};
use voice_helpdesk::domain::conversation::{ConversationState, Intent};
use voice_helpdesk::ports::{AIError, IntentClassifier, TicketingError};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn fast_retries() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        multiplier: 2.0,
    }
}

fn build_flow(classifier: Arc<dyn IntentClassifier>, helpdesk: &InMemoryHelpdesk) -> Arc<ConversationFlow> {
    Arc::new(ConversationFlow::new(
        Arc::new(InMemoryConversationStore::new()),
        classifier,
        Arc::new(ArticleKnowledgeBase::new(Arc::new(helpdesk.clone()))),
        Arc::new(RetryingTicketing::new(Arc::new(helpdesk.clone()), fast_retries())),
        FlowSettings::default(),
    ))
}

fn app(helpdesk: &InMemoryHelpdesk) -> (Router, Arc<ConversationFlow>) {
    let flow = build_flow(Arc::new(KeywordIntentClassifier::new()), helpdesk);
    let router = create_router(flow.clone(), VoiceSettings::default(), Duration::from_secs(5));
    (router, flow)
}

async fn post_form(router: &Router, uri: &str, form: &str) -> (StatusCode, String) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

// =============================================================================
// Telephony
// =============================================================================

#[tokio::test]
async fn phone_call_escalates_unanswered_issue_to_ticket() {
    let helpdesk = InMemoryHelpdesk::with_sample_articles();
    let (router, flow) = app(&helpdesk);

    let (status, twiml) = post_form(&router, "/voice/incoming", "CallSid=CA100").await;
    assert_eq!(status, StatusCode::OK);
    assert!(twiml.contains("Thank you for calling customer support"));
    assert!(twiml.contains("<Gather"));

    let (_, twiml) = post_form(
        &router,
        "/voice/transcription",
        "CallSid=CA100&SpeechResult=My+printer+is+on+fire&Confidence=0.92",
    )
    .await;
    assert!(twiml.contains("couldn&apos;t find") || twiml.contains("couldn't find"));
    assert!(twiml.contains("<Gather"));

    let (_, twiml) = post_form(
        &router,
        "/voice/transcription",
        "CallSid=CA100&SpeechResult=call+me+on+555-123-4567&Confidence=0.88",
    )
    .await;
    let tickets = helpdesk.tickets().await;
    assert_eq!(tickets.len(), 1);
    assert!(twiml.contains(tickets[0].id.as_str()));
    assert_eq!(tickets[0].ticket.requester_phone.as_deref(), Some("5551234567"));
    assert_eq!(flow.active_conversations().await, 1);

    let (status, _) = post_form(&router, "/voice/status", "CallSid=CA100&CallStatus=completed").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(flow.active_conversations().await, 0);
}

#[tokio::test]
async fn caller_hangs_up_after_solution() {
    let helpdesk = InMemoryHelpdesk::with_sample_articles();
    let (router, _) = app(&helpdesk);

    post_form(&router, "/voice/incoming", "CallSid=CA200").await;
    let (_, twiml) = post_form(
        &router,
        "/voice/transcription",
        "CallSid=CA200&SpeechResult=How+does+the+billing+cycle+work&Confidence=0.95",
    )
    .await;
    assert!(twiml.contains("Billing Cycle Explained"));

    let (_, twiml) = post_form(
        &router,
        "/voice/transcription",
        "CallSid=CA200&SpeechResult=goodbye&Confidence=0.95",
    )
    .await;
    assert!(twiml.contains("Goodbye"));
    assert!(twiml.contains("<Hangup"));
    assert!(!twiml.contains("<Gather"));
    assert_eq!(helpdesk.ticket_count().await, 0);
}

// =============================================================================
// JSON API
// =============================================================================

#[tokio::test]
async fn ticket_creation_is_retried_on_transient_failure() {
    let helpdesk = InMemoryHelpdesk::with_sample_articles();
    helpdesk
        .fail_next_ticket(TicketingError::Network("connection reset".into()))
        .await;
    let (router, _) = app(&helpdesk);

    let response = router
        .clone()
        .oneshot(Request::post("/conversations").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let started: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let id = started["conversationId"].as_str().unwrap();

    let response = router
        .oneshot(
            Request::post(format!("/conversations/{}/messages", id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({"text": "email me: carol dot west at gmail dot com"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let turn: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(turn["state"], "ended");
    let tickets = helpdesk.tickets().await;
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].ticket.requester_email.as_deref(), Some("carol.west@gmail.com"));
}

// =============================================================================
// LLM classification
// =============================================================================

#[tokio::test]
async fn llm_classification_drives_the_flow() {
    let provider = MockAIProvider::new()
        .with_error(AIError::network("timeout"))
        .with_response(r#"{"intent": "password_reset", "entities": []}"#)
        .with_response(r#"{"intent": "deny", "entities": []}"#);
    let classifier = RetryingClassifier::new(
        Arc::new(LlmIntentClassifier::new(Arc::new(provider.clone()))),
        fast_retries(),
    );
    let helpdesk = InMemoryHelpdesk::with_sample_articles();
    let flow = build_flow(Arc::new(classifier), &helpdesk);

    let (id, _) = flow.start_conversation().await.unwrap();
    let turn = flow.handle_turn(id, "I forgot my password", 0.9).await;
    assert_eq!(turn.state, ConversationState::ProvidingSolution);

    let turn = flow.handle_turn(id, "nah", 0.9).await;
    assert_eq!(turn.state, ConversationState::CreatingTicket);
    assert_eq!(turn.response, responses::SOLUTION_DENIED);

    assert_eq!(provider.call_count(), 3);
    let context = flow.snapshot(id).await.unwrap().unwrap();
    assert_eq!(context.last_intent(), Some(Intent::Deny));
}

#[tokio::test]
async fn invalid_llm_label_degrades_to_unknown() {
    let provider = MockAIProvider::new().with_response(r#"{"intent": "refund_request"}"#);
    let helpdesk = InMemoryHelpdesk::with_sample_articles();
    let flow = build_flow(Arc::new(LlmIntentClassifier::new(Arc::new(provider))), &helpdesk);

    let (id, _) = flow.start_conversation().await.unwrap();
    let turn = flow.handle_turn(id, "I want my money back", 0.9).await;

    let context = flow.snapshot(id).await.unwrap().unwrap();
    assert_eq!(context.last_intent(), Some(Intent::Unknown));
    assert_ne!(turn.response, responses::APOLOGY);
}
