//! Contact-information extraction from spoken text.
//!
//! Speech-to-text renders "john.smith@gmail.com" as "john dot smith at gmail
//! dot com", and callers often spell details over several turns, so the
//! extractor looks at recent user history as well as the current utterance.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Entity, Message, EMAIL_ENTITY, PHONE_ENTITY};

/// How many previous user messages are combined with the current one.
pub const HISTORY_WINDOW: usize = 5;

/// Confidence attached to entities produced by the extractor.
const EXTRACTED_CONFIDENCE: f64 = 0.9;

const KNOWN_PROVIDERS: [&str; 4] = ["gmail", "yahoo", "hotmail", "outlook"];

static SPOKEN_AT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\bat\b\s*").expect("spoken 'at' pattern is valid"));

static LITERAL_AT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*@\s*").expect("literal '@' pattern is valid"));

static SPOKEN_DOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\bdot\b\s*").expect("spoken 'dot' pattern is valid"));

static STRICT_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern is valid")
});

static USERNAME_BEFORE_AT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([a-zA-Z0-9._%+-]{2,})@").expect("username pattern is valid")
});

// "johnsmith gmail" or "johnsmith gmail.com" closing the text, with no "at" spoken.
static USERNAME_BEFORE_TRAILING_PROVIDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([a-z0-9._%+-]{2,})\s+(?:gmail|yahoo|hotmail|outlook)(?:\.com)?[\s.,!?]*$")
        .expect("trailing provider pattern is valid")
});

/// Words that can sit in front of a provider name without being a username.
const NOT_USERNAMES: [&str; 19] = [
    "my", "your", "the", "a", "an", "into", "in", "on", "with", "via", "is", "use", "using",
    "from", "about", "for", "to", "and", "of",
];

static PROVIDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(gmail|yahoo|hotmail|outlook)\b").expect("provider pattern is valid")
});

/// Phone patterns, tried in order.
static PHONE_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        // 5551234567, 15551234567, +15551234567
        Regex::new(r"(?:\+1|\b1?)\d{10}\b").expect("bare phone pattern is valid"),
        // 555-123-4567, 555.123.4567, 555 123 4567
        Regex::new(r"(?:(?:\+1|\b1)[\s.-]?)?\b\d{3}[\s.-]\d{3}[\s.-]\d{4}\b")
            .expect("separated phone pattern is valid"),
        // (555) 123-4567
        Regex::new(r"(?:(?:\+1|\b1)[\s.-]?)?\(\d{3}\)\s*\d{3}[\s.-]?\d{4}\b")
            .expect("area code phone pattern is valid"),
    ]
});

/// Email and/or phone found in caller speech.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none()
    }

    /// Converts the found fields into context entities.
    pub fn to_entities(&self) -> Vec<Entity> {
        let mut entities = Vec::new();
        if let Some(email) = &self.email {
            if let Ok(entity) = Entity::new(EMAIL_ENTITY, email.as_str(), EXTRACTED_CONFIDENCE) {
                entities.push(entity);
            }
        }
        if let Some(phone) = &self.phone {
            if let Ok(entity) = Entity::new(PHONE_ENTITY, phone.as_str(), EXTRACTED_CONFIDENCE) {
                entities.push(entity);
            }
        }
        entities
    }
}

/// Extracts contact details from `message`, using up to [`HISTORY_WINDOW`]
/// previous user messages from `history` as leading context.
///
/// Never fails; fields that cannot be found are `None`. When several
/// candidates exist the most recent one wins.
pub fn extract_contact_info(message: &str, history: &[Message]) -> ContactInfo {
    let mut recent: Vec<&str> = history
        .iter()
        .rev()
        .filter(|m| m.is_user())
        .take(HISTORY_WINDOW)
        .map(|m| m.content.as_str())
        .collect();
    recent.reverse();
    recent.push(message);
    let combined = recent.join(" ");

    ContactInfo {
        email: find_email(&combined),
        phone: find_phone(&combined),
    }
}

/// Rewrites spoken punctuation ("at", "dot") into symbols.
pub fn normalize_spoken(text: &str) -> String {
    let text = SPOKEN_AT.replace_all(text, "@");
    let text = LITERAL_AT.replace_all(&text, "@");
    SPOKEN_DOT.replace_all(&text, ".").into_owned()
}

fn find_email(text: &str) -> Option<String> {
    let normalized = normalize_spoken(text);

    if let Some(found) = STRICT_EMAIL.find_iter(&normalized).last() {
        return Some(found.as_str().trim_end_matches('.').to_lowercase());
    }

    let provider = PROVIDER
        .captures_iter(&normalized)
        .last()
        .map(|c| c[1].to_lowercase())?;
    USERNAME_BEFORE_AT
        .captures_iter(&normalized)
        .map(|c| c[1].trim_matches('.').to_lowercase())
        .filter(|user| is_username(user))
        .last()
        .or_else(|| {
            USERNAME_BEFORE_TRAILING_PROVIDER
                .captures(&normalized)
                .map(|c| c[1].trim_matches('.').to_lowercase())
                .filter(|user| is_username(user) && !NOT_USERNAMES.contains(&user.as_str()))
        })
        .map(|user| format!("{}@{}.com", user, provider))
}

fn is_username(candidate: &str) -> bool {
    candidate.len() >= 2 && !KNOWN_PROVIDERS.contains(&candidate)
}

fn find_phone(text: &str) -> Option<String> {
    PHONE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find_iter(text).last())
        .map(|m| m.as_str().trim().to_string())
}
