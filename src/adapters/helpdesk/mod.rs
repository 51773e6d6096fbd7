//! Helpdesk adapters: article sources and ticketing.
//!
//! - `KayakoClient` - Kayako REST API
//! - `InMemoryHelpdesk` - Sample catalogue and recorded tickets

mod in_memory;
mod kayako;

pub use in_memory::{sample_articles, InMemoryHelpdesk, StoredTicket};
pub use kayako::{KayakoClient, KayakoConfig};
