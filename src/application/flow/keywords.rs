//! Keyword checks applied on top of the classifier.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::conversation::Intent;

static FAREWELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(bye|goodbye)\b").expect("farewell pattern is valid"));

static HUMAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(human|agent|representative)s?\b").expect("human pattern is valid")
});

const CAPABILITY_PHRASES: [&str; 4] = [
    "what can you do",
    "how can you help",
    "what do you do",
    "your capabilities",
];

/// Open-ended requests that only ask about capabilities when nothing
/// specific follows them.
const OPEN_HELP_PHRASES: [&str; 2] = ["help me with", "assist me with"];

const VAGUE_WORDS: [&str; 14] = [
    "a", "an", "some", "few", "something", "anything", "stuff", "thing", "things",
    "question", "questions", "today", "please", "now",
];

/// Overrides an `Unknown` classification when the utterance says goodbye.
pub fn apply_fallbacks(intent: Intent, text: &str) -> Intent {
    if intent == Intent::Unknown && FAREWELL.is_match(text) {
        Intent::EndConversation
    } else {
        intent
    }
}

/// True when an unclassified utterance asks for a person.
pub fn wants_human(intent: Intent, text: &str) -> bool {
    intent == Intent::Unknown && HUMAN.is_match(text)
}

/// True when the caller asks what the assistant can do rather than
/// describing a problem.
pub fn is_capability_query(intent: Intent, text: &str) -> bool {
    let lowered = text.to_lowercase();
    if CAPABILITY_PHRASES.iter().any(|p| lowered.contains(p)) {
        return true;
    }
    if !matches!(intent, Intent::GeneralQuery | Intent::Unknown) {
        return false;
    }
    OPEN_HELP_PHRASES.iter().any(|phrase| {
        lowered
            .find(phrase)
            .map(|at| names_nothing(&lowered[at + phrase.len()..]))
            .unwrap_or(false)
    })
}

fn names_nothing(rest: &str) -> bool {
    rest.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|word| !word.is_empty())
        .all(|word| VAGUE_WORDS.contains(&word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goodbye_overrides_unknown() {
        assert_eq!(apply_fallbacks(Intent::Unknown, "ok, Bye!"), Intent::EndConversation);
        assert_eq!(apply_fallbacks(Intent::Unknown, "goodbye"), Intent::EndConversation);
    }

    #[test]
    fn classified_intent_is_kept() {
        assert_eq!(apply_fallbacks(Intent::Deny, "no, bye"), Intent::Deny);
    }

    #[test]
    fn bye_inside_a_word_is_ignored() {
        assert_eq!(apply_fallbacks(Intent::Unknown, "byename"), Intent::Unknown);
    }

    #[test]
    fn human_request_only_when_unknown() {
        assert!(wants_human(Intent::Unknown, "let me talk to a human"));
        assert!(wants_human(Intent::Unknown, "get me an Agent"));
        assert!(!wants_human(Intent::BillingIssue, "a human charged me twice"));
        assert!(!wants_human(Intent::Unknown, "humanitarian aid"));
    }

    #[test]
    fn capability_phrases() {
        assert!(is_capability_query(Intent::GeneralQuery, "So what can you do?"));
        assert!(is_capability_query(Intent::Unknown, "how can you help"));
        assert!(!is_capability_query(Intent::PasswordReset, "my password expired"));
    }

    #[test]
    fn open_ended_help_request_is_a_capability_query() {
        assert!(is_capability_query(Intent::GeneralQuery, "Can you help me with something?"));
        assert!(is_capability_query(Intent::Unknown, "could you assist me with a few things today"));
        assert!(is_capability_query(Intent::GeneralQuery, "can you help me with"));
    }

    #[test]
    fn help_request_naming_a_problem_is_not_a_capability_query() {
        assert!(!is_capability_query(Intent::GeneralQuery, "Can you help me with my account"));
        assert!(!is_capability_query(Intent::PasswordReset, "can you help me with something, my password expired"));
        assert!(!is_capability_query(Intent::BillingIssue, "help me with a refund"));
    }
}
