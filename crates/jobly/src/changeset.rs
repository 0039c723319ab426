//! Changeset-style validation error types.
//!
//! Input types collect every failing field before rejecting a request, so a
//! client sees all problems at once.

use serde::Serialize;
use std::fmt;

/// A machine-friendly validation code.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationCode {
    Required,
    Len,
    Range,
    Email,
    Url,
    Format,
    Custom(String),
}

impl ValidationCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::Len => "len",
            Self::Range => "range",
            Self::Email => "email",
            Self::Url => "url",
            Self::Format => "format",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl Serialize for ValidationCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A single field validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub code: ValidationCode,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A collection of validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub items: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn push(&mut self, err: ValidationError) {
        self.items.push(err);
    }

    pub fn extend(&mut self, other: Self) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.items.iter()
    }

    /// Whether any error concerns `field`.
    pub fn has(&self, field: &str) -> bool {
        self.items.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    // ----- field checks -----

    /// Require `value` to have between `min` and `max` characters.
    pub fn check_len(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min || len > max {
            self.push(ValidationError::new(
                field,
                ValidationCode::Len,
                format!("must be {min} to {max} characters"),
            ));
        }
    }

    /// Reject an explicit `null` for a patch field whose column is `NOT NULL`.
    pub fn check_not_null<T>(&mut self, field: &str, value: &Option<Option<T>>) {
        if matches!(value, Some(None)) {
            self.push(ValidationError::new(
                field,
                ValidationCode::Required,
                "cannot be null",
            ));
        }
    }

    /// Require `value >= min`.
    pub fn check_min<T: PartialOrd + fmt::Display>(&mut self, field: &str, value: T, min: T) {
        if value < min {
            self.push(ValidationError::new(
                field,
                ValidationCode::Range,
                format!("must be at least {min}"),
            ));
        }
    }

    /// Require `min <= value <= max`.
    pub fn check_range<T: PartialOrd + fmt::Display>(&mut self, field: &str, value: T, min: T, max: T) {
        if value < min || value > max {
            self.push(ValidationError::new(
                field,
                ValidationCode::Range,
                format!("must be between {min} and {max}"),
            ));
        }
    }

    pub fn check_email(&mut self, field: &str, value: &str) {
        if !crate::validate::is_email(value) {
            self.push(ValidationError::new(
                field,
                ValidationCode::Email,
                "must be a valid email address",
            ));
        }
    }

    pub fn check_url(&mut self, field: &str, value: &str) {
        if !crate::validate::is_url(value) {
            self.push(ValidationError::new(field, ValidationCode::Url, "must be a valid URL"));
        }
    }
}

/// Input types that can be checked before they reach the database.
pub trait Validate {
    fn validate(&self) -> ValidationErrors;

    /// Convert failures into [`crate::JoblyError::InvalidInput`].
    fn validated(self) -> crate::JoblyResult<Self>
    where
        Self: Sized,
    {
        self.validate().into_result()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_failure() {
        let mut errs = ValidationErrors::default();
        errs.check_len("username", "", 1, 25);
        errs.check_min("salary", -1, 0);
        errs.check_range("equity", 1.5, 0.0, 1.0);
        errs.check_email("email", "not-an-email");
        errs.check_url("logoUrl", "nope");

        assert_eq!(errs.len(), 5);
        assert!(errs.has("equity"));
        assert_eq!(errs.items[1].to_string(), "salary: must be at least 0");
    }

    #[test]
    fn accepts_valid_values() {
        let mut errs = ValidationErrors::default();
        errs.check_len("username", "u1", 1, 25);
        errs.check_min("salary", 0, 0);
        errs.check_email("email", "user1@user.com");
        errs.check_url("logoUrl", "http://c1.img");
        assert!(errs.into_result().is_ok());
    }

    #[test]
    fn explicit_null_is_required_but_absent_is_fine() {
        let mut errs = ValidationErrors::default();
        errs.check_not_null::<String>("title", &None);
        errs.check_not_null("name", &Some(Some("C1")));
        assert!(errs.is_empty());

        errs.check_not_null::<String>("title", &Some(None));
        assert_eq!(errs.items[0].code, ValidationCode::Required);
        assert_eq!(errs.items[0].to_string(), "title: cannot be null");
    }

    #[test]
    fn serializes_codes_as_strings() {
        let err = ValidationError::new("title", ValidationCode::Required, "is required");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "required");
    }
}
