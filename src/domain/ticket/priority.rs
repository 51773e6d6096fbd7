//! Ticket priority vocabulary and the urgency heuristic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::conversation::ConversationContext;

const URGENT_KEYWORDS: [&str; 5] = ["urgent", "emergency", "critical", "broken", "error"];

/// Number of trailing user messages scanned for urgency keywords.
const URGENCY_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    #[default]
    Medium,
    High,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort urgency guess: `High` if a recent caller message mentions an
/// urgency keyword, otherwise `Medium`.
pub fn determine_priority(context: &ConversationContext) -> TicketPriority {
    let urgent = context
        .recent_user_messages(URGENCY_WINDOW)
        .iter()
        .map(|m| m.content.to_lowercase())
        .any(|text| URGENT_KEYWORDS.iter().any(|k| text.contains(k)));

    if urgent {
        TicketPriority::High
    } else {
        TicketPriority::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::MessageRole;
    use crate::domain::foundation::ConversationId;

    fn context_with(user_messages: &[&str]) -> ConversationContext {
        let mut ctx = ConversationContext::new(ConversationId::new());
        for text in user_messages {
            ctx.add_message(MessageRole::User, *text, None, vec![]);
            ctx.add_message(MessageRole::Assistant, "I see, this is an emergency.", None, vec![]);
        }
        ctx
    }

    #[test]
    fn urgency_keyword_raises_priority() {
        let ctx = context_with(&["my app shows an ERROR on startup"]);
        assert_eq!(determine_priority(&ctx), TicketPriority::High);
    }

    #[test]
    fn calm_conversation_is_medium() {
        let ctx = context_with(&["how do billing cycles work"]);
        assert_eq!(determine_priority(&ctx), TicketPriority::Medium);
    }

    #[test]
    fn assistant_wording_is_ignored() {
        let ctx = context_with(&["hello", "thanks"]);
        assert_eq!(determine_priority(&ctx), TicketPriority::Medium);
    }

    #[test]
    fn only_recent_user_messages_count() {
        let ctx = context_with(&["it's urgent", "one", "two", "three"]);
        assert_eq!(determine_priority(&ctx), TicketPriority::Medium);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TicketPriority::High).unwrap(), "\"high\"");
    }
}
