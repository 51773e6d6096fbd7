//! Error types for the conversation flow.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ValidationError};
use crate::ports::{StoreError, TicketingError};

/// Failure to escalate a call to a ticket.
#[derive(Debug, Clone, Error)]
pub enum EscalationError {
    /// Neither email nor phone validated. The caller should re-provide contact details.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The helpdesk failed to create the ticket. Safe to retry.
    #[error("ticket creation failed: {0}")]
    Creation(#[from] TicketingError),
}

/// Failure while processing a turn. Never reaches the caller; the flow turns
/// it into a spoken apology.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("turn panicked: {0}")]
    Panicked(String),
}
