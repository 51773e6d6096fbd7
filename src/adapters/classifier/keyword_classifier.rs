//! Offline intent classifier driven by keyword patterns.
//!
//! Used when no language model is configured and in tests. It never returns
//! entities; contact details are extracted separately by the flow.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::conversation::{ContextEntry, Intent};
use crate::ports::{Classification, ClassificationError, IntentClassifier};

struct Rule {
    intent: Intent,
    pattern: Regex,
}

fn rule(intent: Intent, pattern: &str) -> Rule {
    Rule {
        intent,
        pattern: Regex::new(pattern).expect("keyword rule pattern is valid"),
    }
}

/// Checked in order; first match wins.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule(
            Intent::EndConversation,
            r"(?i)\b(bye|goodbye|that's all|that is all|hang up)\b",
        ),
        rule(
            Intent::Deny,
            r"(?i)^\s*(no|nope|nah|not really)\b|\b(didn't|did not|doesn't|does not) (help|work)\b",
        ),
        rule(
            Intent::Confirm,
            r"(?i)^\s*(yes|yeah|yep|yup|sure|correct|ok|okay)\b|\b(that|it) (helped|worked)\b|\bthank(s| you)\b",
        ),
        rule(Intent::PasswordReset, r"(?i)\bpass ?words?\b"),
        rule(
            Intent::BillingIssue,
            r"(?i)\b(bill|billing|billed|invoice|charged?|charges|payment|refund|subscription)\b",
        ),
        rule(
            Intent::AccountAccess,
            r"(?i)\b(log ?in|sign ?in|locked out|access my account|can't get into)\b",
        ),
        rule(
            Intent::TechnicalProblem,
            r"(?i)\b(error|errors|crash\w*|broken|bug|not working|won't (load|start|open)|freez\w*)\b",
        ),
        rule(
            Intent::GeneralQuery,
            r"(?i)\b(how|what|where|when|why|can i|question|help)\b",
        ),
    ]
});

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentClassifier;

impl KeywordIntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn intent_for(text: &str) -> Intent {
        RULES
            .iter()
            .find(|r| r.pattern.is_match(text))
            .map(|r| r.intent)
            .unwrap_or(Intent::Unknown)
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(
        &self,
        text: &str,
        _context: &[ContextEntry],
    ) -> Result<Classification, ClassificationError> {
        Ok(Classification::new(Self::intent_for(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_keywords() {
        assert_eq!(KeywordIntentClassifier::intent_for("I forgot my password"), Intent::PasswordReset);
        assert_eq!(KeywordIntentClassifier::intent_for("I was charged twice"), Intent::BillingIssue);
        assert_eq!(KeywordIntentClassifier::intent_for("I can't log in"), Intent::AccountAccess);
        assert_eq!(KeywordIntentClassifier::intent_for("the app shows an error"), Intent::TechnicalProblem);
    }

    #[test]
    fn dialogue_acts() {
        assert_eq!(KeywordIntentClassifier::intent_for("Yes, thanks"), Intent::Confirm);
        assert_eq!(KeywordIntentClassifier::intent_for("that helped a lot"), Intent::Confirm);
        assert_eq!(KeywordIntentClassifier::intent_for("No"), Intent::Deny);
        assert_eq!(KeywordIntentClassifier::intent_for("it didn't help"), Intent::Deny);
        assert_eq!(KeywordIntentClassifier::intent_for("ok bye"), Intent::EndConversation);
    }

    #[test]
    fn no_inside_words_is_not_deny() {
        assert_ne!(KeywordIntentClassifier::intent_for("I know my invoice is wrong"), Intent::Deny);
    }

    #[test]
    fn unmatched_text_is_unknown() {
        assert_eq!(KeywordIntentClassifier::intent_for("purple elephants"), Intent::Unknown);
        assert_eq!(KeywordIntentClassifier::intent_for("talk to a human"), Intent::Unknown);
    }

    #[tokio::test]
    async fn classify_never_fails() {
        let c = KeywordIntentClassifier::new().classify("", &[]).await.unwrap();
        assert_eq!(c.intent, Intent::Unknown);
    }
}
