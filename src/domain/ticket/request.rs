//! Ticket request assembled from a conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{determine_priority, TicketPriority, ValidatedContact};
use crate::domain::conversation::{ConversationContext, MessageRole};
use crate::domain::foundation::ConversationId;

const TICKET_SOURCE: &str = "voice_assistant";
const TICKET_CHANNEL: &str = "phone";

/// Status a ticket is filed with. Calls only ever open tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Open,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketStatus::Open => f.write_str("open"),
        }
    }
}

/// One line of the call transcript attached to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMetadata {
    pub source: String,
    pub channel: String,
    pub created_at: DateTime<Utc>,
    pub conversation_id: ConversationId,
    pub transcript: Vec<TranscriptEntry>,
}

impl TicketMetadata {
    pub fn from_context(context: &ConversationContext) -> Self {
        Self {
            source: TICKET_SOURCE.to_string(),
            channel: TICKET_CHANNEL.to_string(),
            created_at: Utc::now(),
            conversation_id: context.conversation_id(),
            transcript: context
                .messages()
                .iter()
                .map(|m| TranscriptEntry {
                    role: m.role,
                    content: m.content.clone(),
                    timestamp: m.timestamp,
                })
                .collect(),
        }
    }
}

/// Everything the helpdesk needs to open a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub subject: String,
    pub body: String,
    pub requester_email: Option<String>,
    pub requester_phone: Option<String>,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub metadata: TicketMetadata,
}

impl NewTicket {
    /// Builds a ticket from the conversation and validated contact details.
    ///
    /// The body is `contents` followed by a description composed from the
    /// transcript.
    pub fn from_context(
        context: &ConversationContext,
        subject: impl Into<String>,
        contents: &str,
        contact: &ValidatedContact,
    ) -> Self {
        let description = compose_description(context);
        let body = if contents.trim().is_empty() {
            description
        } else {
            format!("{}\n\n{}", contents.trim(), description)
        };

        Self {
            subject: subject.into(),
            body,
            requester_email: contact.email().map(str::to_string),
            requester_phone: contact.phone().map(str::to_string),
            priority: determine_priority(context),
            status: TicketStatus::Open,
            metadata: TicketMetadata::from_context(context),
        }
    }
}

/// Summarizes the current issue for a human agent: the caller's opening
/// words and the last thing the assistant tried.
pub fn compose_description(context: &ConversationContext) -> String {
    let issue = context
        .issue_messages()
        .iter()
        .take(3)
        .filter(|m| m.is_user())
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let issue = if issue.is_empty() {
        "No issue description provided".to_string()
    } else {
        issue
    };

    let attempted = context
        .last_assistant_message()
        .map(|m| m.content.as_str())
        .unwrap_or("No solution provided");

    format!(
        "Issue Description:\n{}\n\nLast Attempted Solution:\n{}\n\nFull transcript attached in ticket metadata.",
        issue, attempted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ticket::validate_contact;

    fn sample_context() -> ConversationContext {
        let mut ctx = ConversationContext::new(ConversationId::new());
        ctx.add_message(MessageRole::Assistant, "Hello, how can I help?", None, vec![]);
        ctx.add_message(MessageRole::User, "My invoice is wrong", None, vec![]);
        ctx.add_message(MessageRole::Assistant, "Billing cycles run monthly.", None, vec![]);
        ctx.add_message(MessageRole::User, "That didn't help", None, vec![]);
        ctx
    }

    #[test]
    fn description_uses_opening_issue_and_last_attempt() {
        let description = compose_description(&sample_context());
        assert_eq!(
            description,
            "Issue Description:\nMy invoice is wrong\n\nLast Attempted Solution:\n\
             Billing cycles run monthly.\n\nFull transcript attached in ticket metadata."
        );
    }

    #[test]
    fn description_uses_only_the_current_issue() {
        let mut ctx = sample_context();
        ctx.add_message(MessageRole::Assistant, "Ticket filed.", None, vec![]);
        ctx.add_message(MessageRole::User, "Also my scanner is offline", None, vec![]);
        let latest = ctx.messages().len() - 1;
        ctx.start_new_issue(latest);

        let description = compose_description(&ctx);
        assert!(description.starts_with("Issue Description:\nAlso my scanner is offline\n\n"));
        assert!(!description.contains("invoice"));
    }

    #[test]
    fn description_handles_empty_history() {
        let ctx = ConversationContext::new(ConversationId::new());
        let description = compose_description(&ctx);
        assert!(description.contains("No issue description provided"));
        assert!(description.contains("No solution provided"));
    }

    #[test]
    fn new_ticket_carries_contact_priority_and_transcript() {
        let ctx = sample_context();
        let contact = validate_contact(Some("a@b.com"), Some("(555) 123-4567")).unwrap();
        let ticket = NewTicket::from_context(&ctx, "Voice support request", "Caller issue", &contact);

        assert_eq!(ticket.subject, "Voice support request");
        assert!(ticket.body.starts_with("Caller issue\n\nIssue Description:"));
        assert_eq!(ticket.requester_email.as_deref(), Some("a@b.com"));
        assert_eq!(ticket.requester_phone.as_deref(), Some("5551234567"));
        assert_eq!(ticket.priority, TicketPriority::Medium);
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.metadata.source, "voice_assistant");
        assert_eq!(ticket.metadata.channel, "phone");
        assert_eq!(ticket.metadata.conversation_id, ctx.conversation_id());
        assert_eq!(ticket.metadata.transcript.len(), 4);
    }

    #[test]
    fn blank_contents_leave_only_description() {
        let ctx = sample_context();
        let contact = validate_contact(Some("a@b.com"), None).unwrap();
        let ticket = NewTicket::from_context(&ctx, "s", "  ", &contact);
        assert!(ticket.body.starts_with("Issue Description:"));
    }
}
