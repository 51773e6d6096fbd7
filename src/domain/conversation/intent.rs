//! Caller intents.
//!
//! The classifier must produce exactly one of these per utterance. Parsing is
//! strict: a label outside the closed set is an error, never `Unknown`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// What the caller wants from a single utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    GeneralQuery,
    PasswordReset,
    BillingIssue,
    TechnicalProblem,
    AccountAccess,
    Confirm,
    Deny,
    EndConversation,
    Unknown,
}

impl Intent {
    /// Every intent, in declaration order.
    pub const ALL: [Intent; 9] = [
        Intent::GeneralQuery,
        Intent::PasswordReset,
        Intent::BillingIssue,
        Intent::TechnicalProblem,
        Intent::AccountAccess,
        Intent::Confirm,
        Intent::Deny,
        Intent::EndConversation,
        Intent::Unknown,
    ];

    /// Returns the wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::GeneralQuery => "general_query",
            Intent::PasswordReset => "password_reset",
            Intent::BillingIssue => "billing_issue",
            Intent::TechnicalProblem => "technical_problem",
            Intent::AccountAccess => "account_access",
            Intent::Confirm => "confirm",
            Intent::Deny => "deny",
            Intent::EndConversation => "end_conversation",
            Intent::Unknown => "unknown",
        }
    }

    /// Returns true for intents that describe a support problem.
    pub fn is_issue(&self) -> bool {
        matches!(
            self,
            Intent::GeneralQuery
                | Intent::PasswordReset
                | Intent::BillingIssue
                | Intent::TechnicalProblem
                | Intent::AccountAccess
        )
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Intent::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str().eq_ignore_ascii_case(label))
            .ok_or_else(|| {
                ValidationError::invalid_format("intent", format!("'{}' is not a known intent", s))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_wire_label() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
        }
    }

    #[test]
    fn parsing_ignores_case_and_padding() {
        assert_eq!(" Password_Reset ".parse::<Intent>().unwrap(), Intent::PasswordReset);
    }

    #[test]
    fn rejects_labels_outside_closed_set() {
        let err = "refund_request".parse::<Intent>().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { ref field, .. } if field == "intent"));
    }

    #[test]
    fn rejects_empty_label() {
        assert!("".parse::<Intent>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Intent::EndConversation).unwrap();
        assert_eq!(json, "\"end_conversation\"");
        let back: Intent = serde_json::from_str("\"technical_problem\"").unwrap();
        assert_eq!(back, Intent::TechnicalProblem);
    }

    #[test]
    fn issue_intents_exclude_dialogue_acts() {
        assert!(Intent::BillingIssue.is_issue());
        assert!(!Intent::Confirm.is_issue());
        assert!(!Intent::Unknown.is_issue());
    }
}
