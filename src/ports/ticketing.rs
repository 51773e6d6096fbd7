//! Ticketing port - the helpdesk that receives escalated calls.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::TicketId;
use crate::domain::ticket::NewTicket;

#[async_trait]
pub trait Ticketing: Send + Sync {
    /// Opens a ticket and returns the helpdesk's identifier for it.
    async fn create_ticket(&self, ticket: NewTicket) -> Result<TicketId, TicketingError>;
}

#[derive(Debug, Clone, Error)]
pub enum TicketingError {
    #[error("helpdesk authentication failed: {0}")]
    Authentication(String),

    #[error("helpdesk rejected the ticket: {0}")]
    Rejected(String),

    #[error("helpdesk unavailable: {0}")]
    Unavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected helpdesk response: {0}")]
    InvalidResponse(String),
}

impl TicketingError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TicketingError::Unavailable(_) | TicketingError::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(TicketingError::Network("reset".into()).is_retryable());
        assert!(TicketingError::Unavailable("503".into()).is_retryable());
        assert!(!TicketingError::Rejected("bad requester".into()).is_retryable());
        assert!(!TicketingError::Authentication("401".into()).is_retryable());
    }
}
