//! Kayako helpdesk client.
//!
//! Authenticates with HTTP basic auth once to obtain a session id, then sends
//! it on every call as `X-Session-ID`. Articles are listed through the help
//! center API and cached for a configurable TTL; tickets are created as
//! phone-channel conversations.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::foundation::TicketId;
use crate::domain::ticket::{NewTicket, TicketMetadata};
use crate::ports::{Article, ArticleSource, KnowledgeBaseError, Ticketing, TicketingError};

const ARTICLE_INCLUDES: &str = "contents,titles,tags,section";
const DEFAULT_CATEGORY: &str = "General";
const TICKET_CHANNEL: &str = "Phone";
const SLUG_LOCALE: &str = "en-us";

#[derive(Debug, Clone)]
pub struct KayakoConfig {
    /// API root, e.g. `https://example.kayako.com/api/v1`.
    pub base_url: String,
    pub email: String,
    password: Secret<String>,
    pub timeout: Duration,
    pub article_cache_ttl: Duration,
}

impl KayakoConfig {
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            email: email.into(),
            password: Secret::new(password.into()),
            timeout: Duration::from_secs(15),
            article_cache_ttl: Duration::from_secs(300),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_article_cache_ttl(mut self, ttl: Duration) -> Self {
        self.article_cache_ttl = ttl;
        self
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Session bootstrap lives at `{host}/api/v1/users` whatever the configured root.
    fn session_url(&self) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        let host = trimmed.split("/api/v1").next().unwrap_or(trimmed);
        format!("{}/api/v1/users", host)
    }
}

/// Transport-level failure, mapped onto each port's error type.
#[derive(Debug)]
enum Failure {
    Auth(String),
    Client(String),
    Server(String),
    Network(String),
    Decode(String),
}

impl Failure {
    fn from_status(status: StatusCode, body: String) -> Self {
        let message = format!("{}: {}", status.as_u16(), body);
        match status.as_u16() {
            401 | 403 => Failure::Auth(message),
            400..=499 => Failure::Client(message),
            _ => Failure::Server(message),
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Failure::Decode(err.to_string())
        } else {
            Failure::Network(err.to_string())
        }
    }
}

impl From<Failure> for KnowledgeBaseError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Server(m) | Failure::Network(m) => KnowledgeBaseError::Unavailable(m),
            Failure::Auth(m) | Failure::Client(m) | Failure::Decode(m) => KnowledgeBaseError::Source(m),
        }
    }
}

impl From<Failure> for TicketingError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Auth(m) => TicketingError::Authentication(m),
            Failure::Client(m) => TicketingError::Rejected(m),
            Failure::Server(m) => TicketingError::Unavailable(m),
            Failure::Network(m) => TicketingError::Network(m),
            Failure::Decode(m) => TicketingError::InvalidResponse(m),
        }
    }
}

struct ArticleCache {
    articles: Vec<Article>,
    fetched_at: Instant,
    ttl: Duration,
}

impl ArticleCache {
    fn is_expired(&self) -> bool {
        self.fetched_at.elapsed() > self.ttl
    }
}

pub struct KayakoClient {
    config: KayakoConfig,
    client: Client,
    session_id: Arc<RwLock<Option<String>>>,
    article_cache: Arc<RwLock<Option<ArticleCache>>>,
}

impl KayakoClient {
    pub fn new(config: KayakoConfig) -> Result<Self, TicketingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TicketingError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            session_id: Arc::new(RwLock::new(None)),
            article_cache: Arc::new(RwLock::new(None)),
        })
    }

    async fn session_id(&self) -> Result<String, Failure> {
        if let Some(id) = self.session_id.read().await.as_ref() {
            return Ok(id.clone());
        }

        let url = self.config.session_url();
        debug!(url = %url, "Authenticating with Kayako");
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.email, Some(self.config.password.expose_secret()))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(Failure::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Failure::from_status(status, body));
        }

        let session: SessionResponse = response.json().await.map_err(Failure::from_reqwest)?;
        let id = session
            .session_id
            .ok_or_else(|| Failure::Auth("no session_id in authentication response".to_string()))?;

        *self.session_id.write().await = Some(id.clone());
        info!("Kayako session established");
        Ok(id)
    }

    async fn forget_session(&self) {
        *self.session_id.write().await = None;
    }

    /// Sends a request with the session header, returning the JSON body.
    async fn send(&self, request: RequestBuilder) -> Result<Value, Failure> {
        let session_id = self.session_id().await?;
        let response = request
            .header("X-Session-ID", &session_id)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(Failure::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                self.forget_session().await;
            }
            let body = response.text().await.unwrap_or_default();
            return Err(Failure::from_status(status, body));
        }

        response.json().await.map_err(Failure::from_reqwest)
    }

    async fn locale_field(&self, field_id: &str) -> Result<String, Failure> {
        let url = self.config.api_url(&format!("locale/fields/{}.json", field_id));
        let body = self.send(self.client.get(url)).await?;
        Ok(body["data"]["translation"].as_str().unwrap_or_default().to_string())
    }

    async fn fetch_article(&self, id: &str) -> Result<Article, Failure> {
        let url = self.config.api_url(&format!("articles/{}.json", id));
        let body = self
            .send(self.client.get(url).query(&[("include", ARTICLE_INCLUDES)]))
            .await?;
        let item: ArticleItem = serde_json::from_value(body["data"].clone())
            .map_err(|e| Failure::Decode(e.to_string()))?;

        let mut title = match item.titles.first() {
            Some(field) => self.locale_field(&field.id_string()).await?,
            None => String::new(),
        };
        if title.trim().is_empty() {
            title = slug_title(&item.slugs).unwrap_or_default();
        }

        let content = match item.contents.first() {
            Some(field) => self.locale_field(&field.id_string()).await?,
            None => String::new(),
        };

        Ok(item.into_article(title, content))
    }

    async fn fetch_articles(&self) -> Result<Vec<Article>, Failure> {
        let url = self.config.api_url("articles.json");
        let body = self
            .send(self.client.get(url).query(&[("include", ARTICLE_INCLUDES)]))
            .await?;

        let ids: Vec<String> = body["data"]
            .as_array()
            .map(|items| items.iter().filter_map(|item| json_id(&item["id"])).collect())
            .unwrap_or_default();

        let mut articles = Vec::with_capacity(ids.len());
        for id in ids {
            match self.fetch_article(&id).await {
                Ok(article) => articles.push(article),
                Err(err) => warn!(article_id = %id, error = ?err, "Skipping unreadable article"),
            }
        }
        Ok(articles)
    }
}

#[async_trait]
impl ArticleSource for KayakoClient {
    async fn list_articles(&self) -> Result<Vec<Article>, KnowledgeBaseError> {
        if let Some(cache) = self.article_cache.read().await.as_ref() {
            if !cache.is_expired() {
                return Ok(cache.articles.clone());
            }
        }

        let articles = self.fetch_articles().await?;
        info!(articles = articles.len(), "Fetched Kayako articles");
        *self.article_cache.write().await = Some(ArticleCache {
            articles: articles.clone(),
            fetched_at: Instant::now(),
            ttl: self.config.article_cache_ttl,
        });
        Ok(articles)
    }
}

#[async_trait]
impl Ticketing for KayakoClient {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<TicketId, TicketingError> {
        let payload = ConversationPayload::from(&ticket);
        let url = self.config.api_url("conversations");
        let body = self.send(self.client.post(url).json(&payload)).await?;

        let id = json_id(&body["id"])
            .or_else(|| json_id(&body["data"]["id"]))
            .ok_or_else(|| TicketingError::InvalidResponse("no id in response".to_string()))?;
        let id = TicketId::new(id).map_err(|e| TicketingError::InvalidResponse(e.to_string()))?;

        info!(ticket_id = %id, priority = %ticket.priority, "Created Kayako conversation");
        Ok(id)
    }
}

// ----- Kayako API Types -----

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FieldRef {
    id: Value,
}

impl FieldRef {
    fn id_string(&self) -> String {
        json_id(&self.id).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Slug {
    #[serde(default)]
    locale: String,
    #[serde(default)]
    translation: String,
}

#[derive(Debug, Default, Deserialize)]
struct Section {
    #[serde(default)]
    slugs: Vec<Slug>,
}

#[derive(Debug, Deserialize)]
struct ArticleItem {
    id: Value,
    #[serde(default)]
    titles: Vec<FieldRef>,
    #[serde(default)]
    contents: Vec<FieldRef>,
    #[serde(default)]
    slugs: Vec<Slug>,
    #[serde(default)]
    section: Option<Section>,
    #[serde(default)]
    tags: Vec<FieldRef>,
}

impl ArticleItem {
    fn into_article(self, title: String, content: String) -> Article {
        let category = self
            .section
            .as_ref()
            .and_then(|s| slug_title(&s.slugs))
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        Article {
            id: json_id(&self.id).unwrap_or_default(),
            title,
            content,
            tags: self.tags.iter().map(FieldRef::id_string).collect(),
            category: Some(category),
        }
    }
}

#[derive(Debug, Serialize)]
struct Requester<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ConversationMessage<'a> {
    content: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ConversationPayload<'a> {
    subject: &'a str,
    channel: &'static str,
    status: String,
    priority: &'static str,
    requester: Requester<'a>,
    messages: Vec<ConversationMessage<'a>>,
    metadata: &'a TicketMetadata,
}

impl<'a> From<&'a NewTicket> for ConversationPayload<'a> {
    fn from(ticket: &'a NewTicket) -> Self {
        Self {
            subject: &ticket.subject,
            channel: TICKET_CHANNEL,
            status: ticket.status.to_string(),
            priority: ticket.priority.as_str(),
            requester: Requester {
                email: ticket.requester_email.as_deref(),
                phone: ticket.requester_phone.as_deref(),
            },
            messages: vec![ConversationMessage {
                content: &ticket.body,
                kind: "reply",
            }],
            metadata: &ticket.metadata,
        }
    }
}

/// Ids arrive as numbers or strings depending on the endpoint.
fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// "reset-your-password" -> "Reset Your Password", preferring the en-us slug.
fn slug_title(slugs: &[Slug]) -> Option<String> {
    let slug = slugs
        .iter()
        .find(|s| s.locale.eq_ignore_ascii_case(SLUG_LOCALE))
        .or_else(|| slugs.first())?;
    let title = slug
        .translation
        .split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    (!title.is_empty()).then_some(title)
}
