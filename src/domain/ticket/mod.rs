//! Ticket domain module.
//!
//! Contact validation, the urgency heuristic and ticket composition used when
//! a call is escalated to a human agent.

mod priority;
mod request;
mod validation;

pub use priority::{determine_priority, TicketPriority};
pub use request::{compose_description, NewTicket, TicketMetadata, TicketStatus, TranscriptEntry};
pub use validation::{is_valid_email, normalize_phone, validate_contact, ValidatedContact};
