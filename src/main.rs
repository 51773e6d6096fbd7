//! Voice Helpdesk server entry point.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use voice_helpdesk::adapters::ai::{OpenAIConfig, OpenAIProvider};
use voice_helpdesk::adapters::classifier::{KeywordIntentClassifier, LlmIntentClassifier};
use voice_helpdesk::adapters::helpdesk::{InMemoryHelpdesk, KayakoClient, KayakoConfig};
use voice_helpdesk::adapters::http::create_router;
use voice_helpdesk::adapters::knowledge_base::ArticleKnowledgeBase;
use voice_helpdesk::adapters::resilience::{
    RetryingAIProvider, RetryingClassifier, RetryingKnowledgeBase, RetryingTicketing,
};
use voice_helpdesk::adapters::storage::InMemoryConversationStore;
use voice_helpdesk::application::ConversationFlow;
use voice_helpdesk::config::{AppConfig, HelpdeskProvider, LogFormat, ValidationError};
use voice_helpdesk::ports::{AIProvider, ArticleSource, IntentClassifier, KnowledgeBase, Ticketing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.server.environment,
        "Starting Voice Helpdesk"
    );

    let flow = Arc::new(build_flow(&config)?);

    // Warm the knowledge base so the first caller does not wait on it.
    let warmup = flow.clone();
    tokio::spawn(async move {
        warmup.knowledge_base_ready().await;
    });

    let app = create_router(flow, config.voice_settings(), config.server.request_timeout());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wires collaborators according to configuration.
fn build_flow(config: &AppConfig) -> Result<ConversationFlow, Box<dyn std::error::Error>> {
    let policy = config.retry.policy();
    let ai_policy = policy.with_max_attempts(config.ai.max_retries.max(1));

    let llm: Option<Arc<dyn AIProvider>> = match config.ai.openai_key() {
        Some(key) => {
            let openai = OpenAIConfig::new(key)
                .with_model(config.ai.model.clone())
                .with_base_url(config.ai.base_url.clone())
                .with_timeout(config.ai.timeout());
            tracing::info!(model = %config.ai.model, "Using OpenAI for classification and summaries");
            let provider: Arc<dyn AIProvider> = Arc::new(OpenAIProvider::new(openai)?);
            Some(provider)
        }
        None => {
            tracing::warn!("No OpenAI key configured, using keyword classification");
            None
        }
    };

    let classifier: Arc<dyn IntentClassifier> = match &llm {
        Some(provider) => Arc::new(RetryingClassifier::new(
            Arc::new(LlmIntentClassifier::new(provider.clone())),
            ai_policy,
        )),
        None => Arc::new(KeywordIntentClassifier::new()),
    };

    let (articles, ticketing): (Arc<dyn ArticleSource>, Arc<dyn Ticketing>) =
        match config.helpdesk.provider {
            HelpdeskProvider::Kayako => {
                let credentials = config.helpdesk.kayako_credentials().ok_or(
                    ValidationError::MissingRequired(
                        "HELPDESK__BASE_URL, HELPDESK__EMAIL and HELPDESK__PASSWORD",
                    ),
                )?;
                let kayako = Arc::new(KayakoClient::new(
                    KayakoConfig::new(credentials.base_url, credentials.email, credentials.password)
                        .with_timeout(config.helpdesk.timeout())
                        .with_article_cache_ttl(config.helpdesk.article_cache_ttl()),
                )?);
                tracing::info!(base_url = credentials.base_url, "Using Kayako helpdesk");
                let articles: Arc<dyn ArticleSource> = kayako.clone();
                let ticketing: Arc<dyn Ticketing> = kayako;
                (articles, ticketing)
            }
            HelpdeskProvider::InMemory => {
                let helpdesk = Arc::new(InMemoryHelpdesk::with_sample_articles());
                tracing::info!("Using in-memory helpdesk with sample articles");
                let articles: Arc<dyn ArticleSource> = helpdesk.clone();
                let ticketing: Arc<dyn Ticketing> = helpdesk;
                (articles, ticketing)
            }
        };

    let mut knowledge_base = ArticleKnowledgeBase::new(articles)
        .with_threshold(config.flow.kb_relevance_threshold);
    if let Some(provider) = &llm {
        knowledge_base = knowledge_base
            .with_summarizer(Arc::new(RetryingAIProvider::new(provider.clone(), ai_policy)));
    }
    let knowledge_base: Arc<dyn KnowledgeBase> =
        Arc::new(RetryingKnowledgeBase::new(Arc::new(knowledge_base), policy));

    Ok(ConversationFlow::new(
        Arc::new(InMemoryConversationStore::new()),
        classifier,
        knowledge_base,
        Arc::new(RetryingTicketing::new(ticketing, policy)),
        config.flow.settings(),
    ))
}

fn init_tracing(config: &AppConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let fmt_layer = match config.server.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
