//! Typed, confidence-scored facts extracted from caller speech.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Entity type used for email addresses found by the contact extractor.
pub const EMAIL_ENTITY: &str = "email";

/// Entity type used for phone numbers found by the contact extractor.
pub const PHONE_ENTITY: &str = "phone";

/// A detected entity such as an email address or an account number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    entity_type: String,
    value: String,
    confidence: f64,
}

impl Entity {
    /// Creates an entity, validating that the type is present and the
    /// confidence lies in `[0, 1]`.
    pub fn new(
        entity_type: impl Into<String>,
        value: impl Into<String>,
        confidence: f64,
    ) -> Result<Self, ValidationError> {
        let entity_type = entity_type.into();
        if entity_type.trim().is_empty() {
            return Err(ValidationError::empty_field("entity.type"));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ValidationError::out_of_range(
                "entity.confidence",
                0.0,
                1.0,
                confidence,
            ));
        }
        Ok(Self {
            entity_type,
            value: value.into(),
            confidence,
        })
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_confidence_bounds() {
        assert!(Entity::new("email", "a@b.co", 0.0).is_ok());
        assert!(Entity::new("email", "a@b.co", 1.0).is_ok());
    }

    #[test]
    fn rejects_confidence_above_one() {
        let err = Entity::new("email", "a@b.co", 1.01).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn rejects_nan_confidence() {
        assert!(Entity::new("email", "a@b.co", f64::NAN).is_err());
    }

    #[test]
    fn rejects_blank_type() {
        let err = Entity::new("  ", "x", 0.5).unwrap_err();
        assert_eq!(err, ValidationError::empty_field("entity.type"));
    }

    #[test]
    fn serializes_type_field_name() {
        let entity = Entity::new("account_id", "12345", 0.8).unwrap();
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "account_id");
        assert_eq!(json["value"], "12345");
    }
}
