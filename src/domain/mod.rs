//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, errors, state machine trait)
//! - `conversation` - Per-call state machine, context aggregate and contact extraction
//! - `ticket` - Contact validation, priority heuristic and ticket composition

pub mod conversation;
pub mod foundation;
pub mod ticket;
