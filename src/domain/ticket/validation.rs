//! Contact validation for ticket requesters.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::foundation::ValidationError;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern is valid")
});

static PHONE_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\-\(\)\.]").expect("separator pattern is valid"));

// 10 to 14 digits in total, country code included.
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?\d{10,14}$").expect("phone pattern is valid"));

/// Contact details that passed validation. At least one field is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedContact {
    email: Option<String>,
    phone: Option<String>,
}

impl ValidatedContact {
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Phone digits with separators removed.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

/// Strips separators and returns the number if it looks dialable.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let cleaned = PHONE_SEPARATORS.replace_all(phone.trim(), "");
    PHONE.is_match(&cleaned).then(|| cleaned.into_owned())
}

/// Validates the requester's contact details.
///
/// An invalid field is dropped as long as the other one validates; only when
/// neither is usable does this fail.
pub fn validate_contact(
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<ValidatedContact, ValidationError> {
    let email = email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .filter(|e| is_valid_email(e))
        .map(str::to_string);
    let phone = phone.and_then(normalize_phone);

    if email.is_none() && phone.is_none() {
        return Err(ValidationError::missing_contact(
            "a valid email address or phone number is required",
        ));
    }

    Ok(ValidatedContact { email, phone })
}
