//! Application layer - orchestrates domain operations across ports.
//!
//! The conversation flow composes the intent classifier, knowledge base,
//! ticketing and conversation store into the per-turn call logic.

pub mod flow;

pub use flow::{
    ConversationFlow, EscalationError, FlowError, FlowSettings, TicketEscalator, TurnOutcome,
};
