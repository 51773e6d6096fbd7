//! Conversation flow: the state-machine orchestrator and ticket escalation.
//!
//! `ConversationFlow` owns the registry of live calls and is the only code
//! that mutates a `ConversationContext`. `TicketEscalator` borrows a context
//! just long enough to file a ticket.

mod errors;
mod escalator;
mod keywords;
mod orchestrator;
pub mod responses;

pub use errors::{EscalationError, FlowError};
pub use escalator::TicketEscalator;
pub use orchestrator::{ConversationFlow, FlowSettings, TurnOutcome};
