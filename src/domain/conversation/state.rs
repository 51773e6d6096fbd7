//! Conversation state machine.
//!
//! Defines the states a support call moves through and the events that
//! move it. Only the (state, event) pairs listed in [`ConversationState::on`]
//! are legal; everything else is rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// The state of a support conversation.
///
/// - `Greeting`: call just connected, greeting not yet delivered
/// - `CollectingIssue`: gathering the caller's problem (or contact details)
/// - `SearchingKb`: transient, knowledge-base lookup in flight
/// - `ProvidingSolution`: a knowledge-base answer was spoken, awaiting feedback
/// - `CreatingTicket`: escalating, waiting for usable contact details
/// - `Ended`: issue resolved or ticket filed, caller may still continue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Greeting,
    CollectingIssue,
    SearchingKb,
    ProvidingSolution,
    CreatingTicket,
    Ended,
}

/// Events the flow orchestrator feeds into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowEvent {
    /// Greeting delivered.
    Greeted,
    /// Caller volunteered an email address or phone number.
    ContactProvided,
    /// Caller asked for a human.
    EscalationRequested,
    /// Knowledge-base lookup started.
    SearchStarted,
    /// Knowledge base produced an answer.
    SolutionFound,
    /// Knowledge base had nothing relevant, or was unavailable.
    NoSolution,
    /// Turn failed mid-search; return to issue collection.
    SearchAborted,
    /// Caller confirmed (answer helped / wants more help).
    Confirmed,
    /// Caller said the answer did not help.
    Denied,
    /// Ticket was filed.
    TicketCreated,
    /// Caller is done.
    Farewell,
    /// Caller is back with another request after the call concluded.
    Reengaged,
    /// Caller asked what the assistant can do.
    CapabilitiesRequested,
}

impl ConversationState {
    /// Returns the state reached by applying `event`, or `None` if the
    /// event is not legal in this state.
    pub fn on(self, event: FlowEvent) -> Option<ConversationState> {
        use ConversationState::*;
        use FlowEvent::*;

        match (self, event) {
            (Greeting, Greeted) => Some(CollectingIssue),
            (Greeting, CapabilitiesRequested) => Some(CollectingIssue),

            (CollectingIssue, ContactProvided) => Some(CreatingTicket),
            (CollectingIssue, EscalationRequested) => Some(CreatingTicket),
            (CollectingIssue, Farewell) => Some(Ended),
            (CollectingIssue, SearchStarted) => Some(SearchingKb),
            (CollectingIssue, SolutionFound) => Some(ProvidingSolution),
            (CollectingIssue, NoSolution) => Some(CreatingTicket),

            (SearchingKb, SolutionFound) => Some(ProvidingSolution),
            (SearchingKb, NoSolution) => Some(CreatingTicket),
            (SearchingKb, SearchAborted) => Some(CollectingIssue),

            (ProvidingSolution, Confirmed) => Some(Ended),
            (ProvidingSolution, Denied) => Some(CreatingTicket),
            (ProvidingSolution, ContactProvided) => Some(CreatingTicket),
            (ProvidingSolution, EscalationRequested) => Some(CreatingTicket),
            (ProvidingSolution, Farewell) => Some(Ended),
            (ProvidingSolution, CapabilitiesRequested) => Some(CollectingIssue),

            (CreatingTicket, TicketCreated) => Some(Ended),

            (Ended, Confirmed) => Some(CollectingIssue),
            (Ended, Reengaged) => Some(CollectingIssue),
            (Ended, CapabilitiesRequested) => Some(CollectingIssue),

            _ => None,
        }
    }

    /// Returns the wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Greeting => "greeting",
            ConversationState::CollectingIssue => "collecting_issue",
            ConversationState::SearchingKb => "searching_kb",
            ConversationState::ProvidingSolution => "providing_solution",
            ConversationState::CreatingTicket => "creating_ticket",
            ConversationState::Ended => "ended",
        }
    }

    /// Returns true for the transient lookup state.
    pub fn is_transient(&self) -> bool {
        matches!(self, ConversationState::SearchingKb)
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for ConversationState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConversationState::*;
        match self {
            Greeting => vec![CollectingIssue],
            CollectingIssue => vec![SearchingKb, ProvidingSolution, CreatingTicket, Ended],
            SearchingKb => vec![ProvidingSolution, CreatingTicket, CollectingIssue],
            ProvidingSolution => vec![Ended, CreatingTicket, CollectingIssue],
            CreatingTicket => vec![Ended],
            Ended => vec![CollectingIssue],
        }
    }
}
