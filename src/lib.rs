//! Voice Helpdesk - Voice-call customer support assistant
//!
//! Answers support calls turn by turn: classifies what the caller wants,
//! reads back help-center answers, and escalates to a helpdesk ticket when
//! the knowledge base cannot help.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
