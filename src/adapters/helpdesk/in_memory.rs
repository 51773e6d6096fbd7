//! In-memory helpdesk for development and tests.
//!
//! Serves a small article catalogue and records created tickets. Failures can
//! be injected per operation:
//!
//! ```ignore
//! let helpdesk = InMemoryHelpdesk::with_sample_articles();
//! helpdesk.fail_next_ticket(TicketingError::Unavailable("503".into())).await;
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::domain::foundation::TicketId;
use crate::domain::ticket::NewTicket;
use crate::ports::{Article, ArticleSource, KnowledgeBaseError, Ticketing, TicketingError};

/// A ticket accepted by the in-memory helpdesk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTicket {
    pub id: TicketId,
    pub ticket: NewTicket,
}

#[derive(Default)]
struct HelpdeskState {
    articles: Vec<Article>,
    tickets: Vec<StoredTicket>,
    article_failure: Option<KnowledgeBaseError>,
    ticket_failures: VecDeque<TicketingError>,
}

#[derive(Clone, Default)]
pub struct InMemoryHelpdesk {
    inner: Arc<RwLock<HelpdeskState>>,
}

impl InMemoryHelpdesk {
    /// Empty catalogue, no tickets.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HelpdeskState {
                articles,
                ..HelpdeskState::default()
            })),
        }
    }

    pub fn with_sample_articles() -> Self {
        Self::with_articles(sample_articles())
    }

    /// Makes every `list_articles` call fail until cleared.
    pub async fn fail_articles(&self, error: Option<KnowledgeBaseError>) {
        self.inner.write().await.article_failure = error;
    }

    /// Queues a failure for the next `create_ticket` call.
    pub async fn fail_next_ticket(&self, error: TicketingError) {
        self.inner.write().await.ticket_failures.push_back(error);
    }

    pub async fn tickets(&self) -> Vec<StoredTicket> {
        self.inner.read().await.tickets.clone()
    }

    pub async fn ticket_count(&self) -> usize {
        self.inner.read().await.tickets.len()
    }
}

#[async_trait]
impl ArticleSource for InMemoryHelpdesk {
    async fn list_articles(&self) -> Result<Vec<Article>, KnowledgeBaseError> {
        let state = self.inner.read().await;
        match &state.article_failure {
            Some(err) => Err(err.clone()),
            None => Ok(state.articles.clone()),
        }
    }
}

#[async_trait]
impl Ticketing for InMemoryHelpdesk {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<TicketId, TicketingError> {
        let mut state = self.inner.write().await;
        if let Some(err) = state.ticket_failures.pop_front() {
            return Err(err);
        }

        let simple = Uuid::new_v4().simple().to_string();
        let id = TicketId::new(format!("tick-{}", &simple[..8]))
            .map_err(|e| TicketingError::InvalidResponse(e.to_string()))?;

        info!(ticket_id = %id, priority = %ticket.priority, "Stored ticket in memory");
        state.tickets.push(StoredTicket {
            id: id.clone(),
            ticket,
        });
        Ok(id)
    }
}

fn article(id: &str, title: &str, content: &str, tags: &[&str], category: &str) -> Article {
    Article {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        category: Some(category.to_string()),
    }
}

/// Catalogue used in development when no helpdesk is configured.
pub fn sample_articles() -> Vec<Article> {
    vec![
        article(
            "art-001",
            "How to Reset Your Password",
            "To reset your password:\n\
             1. Click on 'Forgot Password' link\n\
             2. Enter your email address\n\
             3. Check your email for reset instructions\n\
             4. Click the reset link and create a new password",
            &["password", "account", "security"],
            "Account Management",
        ),
        article(
            "art-002",
            "Billing Cycle Explained",
            "Our billing cycle runs monthly. Your subscription:\n\
             - Starts on sign up date\n\
             - Renews automatically each month\n\
             - Can be cancelled anytime\n\
             - Provides pro-rated refunds",
            &["billing", "subscription", "payment"],
            "Billing",
        ),
        article(
            "art-003",
            "Getting Started Guide",
            "Welcome to our service! Here's how to get started:\n\
             1. Create your account\n\
             2. Set up your profile\n\
             3. Configure your preferences\n\
             4. Start using the features",
            &["onboarding", "setup", "getting started"],
            "Getting Started",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{ConversationContext, MessageRole};
    use crate::domain::foundation::ConversationId;
    use crate::domain::ticket::validate_contact;

    fn new_ticket() -> NewTicket {
        let mut context = ConversationContext::new(ConversationId::new());
        context.add_message(MessageRole::User, "My invoice is wrong", None, vec![]);
        let contact = validate_contact(Some("ann@example.com"), None).unwrap();
        NewTicket::from_context(&context, "Voice support request", "", &contact)
    }

    #[tokio::test]
    async fn sample_catalogue_has_three_articles() {
        let articles = InMemoryHelpdesk::with_sample_articles().list_articles().await.unwrap();
        let ids: Vec<_> = articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["art-001", "art-002", "art-003"]);
    }

    #[tokio::test]
    async fn created_tickets_are_recorded() {
        let helpdesk = InMemoryHelpdesk::new();
        let id = helpdesk.create_ticket(new_ticket()).await.unwrap();

        assert!(id.as_str().starts_with("tick-"));
        assert_eq!(id.as_str().len(), 13);
        let tickets = helpdesk.tickets().await;
        assert_eq!(tickets[0].id, id);
        assert_eq!(tickets[0].ticket.requester_email.as_deref(), Some("ann@example.com"));
    }

    #[tokio::test]
    async fn injected_ticket_failure_applies_once() {
        let helpdesk = InMemoryHelpdesk::new();
        helpdesk
            .fail_next_ticket(TicketingError::Unavailable("503".into()))
            .await;

        assert!(helpdesk.create_ticket(new_ticket()).await.is_err());
        assert!(helpdesk.create_ticket(new_ticket()).await.is_ok());
        assert_eq!(helpdesk.ticket_count().await, 1);
    }

    #[tokio::test]
    async fn article_failure_persists_until_cleared() {
        let helpdesk = InMemoryHelpdesk::with_sample_articles();
        helpdesk
            .fail_articles(Some(KnowledgeBaseError::unavailable("down")))
            .await;
        assert!(helpdesk.list_articles().await.is_err());

        helpdesk.fail_articles(None).await;
        assert_eq!(helpdesk.list_articles().await.unwrap().len(), 3);
    }
}
