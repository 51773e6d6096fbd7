//! Ticket escalation coordinator.
//!
//! Validates contact details, composes the ticket from the conversation and
//! hands it to the helpdesk. It only borrows the context for the duration of
//! the call and never mutates it; the flow decides what happens to the
//! conversation state afterwards.

use std::sync::Arc;
use tracing::{info, warn};

use super::EscalationError;
use crate::domain::conversation::ConversationContext;
use crate::domain::foundation::TicketId;
use crate::domain::ticket::{validate_contact, NewTicket};
use crate::ports::Ticketing;

#[derive(Clone)]
pub struct TicketEscalator {
    ticketing: Arc<dyn Ticketing>,
}

impl TicketEscalator {
    pub fn new(ticketing: Arc<dyn Ticketing>) -> Self {
        Self { ticketing }
    }

    /// Creates a ticket for the conversation.
    ///
    /// # Errors
    ///
    /// - `EscalationError::Validation` when neither `email` nor `phone` is valid
    /// - `EscalationError::Creation` when the helpdesk call fails
    pub async fn create_ticket(
        &self,
        context: &ConversationContext,
        subject: &str,
        contents: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<TicketId, EscalationError> {
        let conversation_id = context.conversation_id();

        let contact = validate_contact(email, phone).map_err(|err| {
            warn!(%conversation_id, error = %err, "Rejected ticket contact details");
            err
        })?;

        let ticket = NewTicket::from_context(context, subject, contents, &contact);
        let priority = ticket.priority;

        let ticket_id = self.ticketing.create_ticket(ticket).await.map_err(|err| {
            warn!(%conversation_id, error = %err, "Helpdesk failed to create ticket");
            err
        })?;

        info!(
            %conversation_id,
            ticket_id = %ticket_id,
            priority = %priority,
            has_email = contact.email().is_some(),
            has_phone = contact.phone().is_some(),
            "Created support ticket"
        );
        Ok(ticket_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{ConversationState, MessageRole};
    use crate::domain::foundation::ConversationId;
    use crate::domain::ticket::TicketPriority;
    use crate::ports::TicketingError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTicketing {
        created: Mutex<Vec<NewTicket>>,
        fail_with: Option<TicketingError>,
    }

    #[async_trait]
    impl Ticketing for RecordingTicketing {
        async fn create_ticket(&self, ticket: NewTicket) -> Result<TicketId, TicketingError> {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            let mut created = self.created.lock().unwrap();
            created.push(ticket);
            Ok(TicketId::new(format!("tick-{:08}", created.len())).unwrap())
        }
    }

    fn context() -> ConversationContext {
        let mut ctx = ConversationContext::new(ConversationId::new());
        ctx.add_message(MessageRole::Assistant, "Hello", None, vec![]);
        ctx.add_message(MessageRole::User, "My app shows an error", None, vec![]);
        ctx
    }

    #[tokio::test]
    async fn creates_ticket_with_valid_email() {
        let ticketing = Arc::new(RecordingTicketing::default());
        let escalator = TicketEscalator::new(ticketing.clone());
        let ctx = context();

        let id = escalator
            .create_ticket(&ctx, "Support", "App error", Some("a@b.com"), None)
            .await
            .unwrap();

        assert_eq!(id.as_str(), "tick-00000001");
        let created = ticketing.created.lock().unwrap();
        assert_eq!(created[0].requester_email.as_deref(), Some("a@b.com"));
        assert_eq!(created[0].priority, TicketPriority::High);
        assert!(created[0].body.contains("My app shows an error"));
    }

    #[tokio::test]
    async fn missing_contact_is_validation_error_and_context_unchanged() {
        let ticketing = Arc::new(RecordingTicketing::default());
        let escalator = TicketEscalator::new(ticketing.clone());
        let ctx = context();
        let messages_before = ctx.messages().len();

        let err = escalator
            .create_ticket(&ctx, "Support", "", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, EscalationError::Validation(_)));
        assert_eq!(ctx.current_state(), ConversationState::Greeting);
        assert_eq!(ctx.messages().len(), messages_before);
        assert!(ticketing.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_email_with_valid_phone_still_creates() {
        let ticketing = Arc::new(RecordingTicketing::default());
        let escalator = TicketEscalator::new(ticketing.clone());

        escalator
            .create_ticket(&context(), "Support", "", Some("nope"), Some("555 123 4567"))
            .await
            .unwrap();

        let created = ticketing.created.lock().unwrap();
        assert!(created[0].requester_email.is_none());
        assert_eq!(created[0].requester_phone.as_deref(), Some("5551234567"));
    }

    #[tokio::test]
    async fn helpdesk_failure_is_creation_error() {
        let ticketing = Arc::new(RecordingTicketing {
            fail_with: Some(TicketingError::Unavailable("503".into())),
            ..Default::default()
        });
        let escalator = TicketEscalator::new(ticketing);

        let err = escalator
            .create_ticket(&context(), "Support", "", Some("a@b.com"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, EscalationError::Creation(TicketingError::Unavailable(_))));
    }
}
