//! Field-level validation support.
//!
//! Request types derive [`validator::Validate`]; failures are flattened into a
//! list of [`FieldError`]s that callers can inspect rule by rule.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};

use crate::constants::MIN_NAME_LENGTH;

/// Fields whose values must never be echoed back in an error.
const REDACTED_FIELDS: &[&str] = &["password"];

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid username regex"));

// Letters, optionally joined by single spaces, hyphens or apostrophes
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{L}+(?:[ '\-]\p{L}+)*$").expect("valid name regex"));

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldError {
    /// Name of the offending field
    pub field: String,
    /// Rule that failed (`required`, `length`, `email`, `alpha`, ...)
    pub rule: String,
    /// Offending value, when it is safe to disclose
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, rule: impl Into<String>, value: Option<String>) -> Self {
        let field = field.into();
        let value = if REDACTED_FIELDS.contains(&field.as_str()) {
            None
        } else {
            value
        };
        Self {
            field,
            rule: rule.into(),
            value,
        }
    }

    /// Field was required but not supplied.
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "required", None)
    }

    /// Field was supplied but the active backend has no place for it.
    pub fn unsupported(field: impl Into<String>) -> Self {
        Self::new(field, "unsupported", None)
    }

    /// Flatten `validator` output into field errors, sorted by field name.
    pub fn from_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
        let mut flat: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let value = e
                        .params
                        .get("value")
                        .map(|v| v.as_str().map(str::to_owned).unwrap_or_else(|| v.to_string()));
                    FieldError::new(field.to_string(), e.code.to_string(), value)
                })
            })
            .collect();
        flat.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.rule.cmp(&b.rule)));
        flat
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed '{}'", self.field, self.rule)
    }
}

/// Usernames become part of a storage key, so `/` and whitespace are rejected.
pub fn validate_username(value: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("username"))
    }
}

/// Other key segments (list names) share the username alphabet.
pub fn validate_key_segment(value: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("charset"))
    }
}

/// Names must be at least two characters of letters.
pub fn validate_name(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() < MIN_NAME_LENGTH {
        return Err(ValidationError::new("length"));
    }
    if !NAME_RE.is_match(value) {
        return Err(ValidationError::new("alpha"));
    }
    Ok(())
}
