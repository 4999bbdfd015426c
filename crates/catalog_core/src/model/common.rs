//! Shared model vocabulary: entity kinds, validation errors and
//! normalization helpers.
//!
//! # Invariants
//! - `normalize_code` output is lowercase and trimmed.
//! - Blank optional strings normalize to `None`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Maximum accepted length of a display name, in characters.
pub const NAME_MAX_CHARS: usize = 200;

static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{0,63}$").expect("valid code regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));

/// Persisted entity families, used in errors and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Attribute,
    Company,
    ProductType,
    Product,
}

impl EntityKind {
    /// Stable snake_case label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attribute => "attribute",
            Self::Company => "company",
            Self::ProductType => "product_type",
            Self::Product => "product",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model-level rule violations detected before any storage access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name is empty after trim.
    BlankName,
    /// Name exceeds `NAME_MAX_CHARS`.
    NameTooLong { max: usize, actual: usize },
    /// Code does not match `[a-z0-9][a-z0-9_-]{0,63}`.
    InvalidCode(String),
    /// Email is not `local@domain`.
    InvalidEmail(String),
    /// Select attribute was given no options.
    SelectWithoutOptions,
    /// Non-select attribute was given options.
    OptionsNotAllowed(&'static str),
    /// Select option is blank after trim.
    BlankOption,
    /// Select option appears twice (case-insensitive).
    DuplicateOption(String),
    /// Attribute id appears twice in one list.
    DuplicateAttribute(Uuid),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "name must not be blank"),
            Self::NameTooLong { max, actual } => {
                write!(f, "name is {actual} characters long; maximum is {max}")
            }
            Self::InvalidCode(code) => write!(
                f,
                "invalid code `{code}`; expected 1-64 chars of [a-z0-9_-] starting with a letter or digit"
            ),
            Self::InvalidEmail(email) => write!(f, "invalid email `{email}`"),
            Self::SelectWithoutOptions => write!(f, "select attribute requires at least one option"),
            Self::OptionsNotAllowed(kind) => {
                write!(f, "attribute kind `{kind}` does not accept options")
            }
            Self::BlankOption => write!(f, "attribute option must not be blank"),
            Self::DuplicateOption(option) => write!(f, "duplicate attribute option `{option}`"),
            Self::DuplicateAttribute(id) => write!(f, "attribute listed more than once: {id}"),
        }
    }
}

impl Error for ValidationError {}

/// Trims a display name.
pub fn normalize_name(value: &str) -> String {
    value.trim().to_string()
}

/// Trims and lowercases a code.
pub fn normalize_code(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Trims an optional string, mapping blank input to `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::BlankName);
    }
    let actual = name.chars().count();
    if actual > NAME_MAX_CHARS {
        return Err(ValidationError::NameTooLong {
            max: NAME_MAX_CHARS,
            actual,
        });
    }
    Ok(())
}

pub(crate) fn validate_code(code: &str) -> Result<(), ValidationError> {
    if CODE_RE.is_match(code) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCode(code.to_string()))
    }
}

pub(crate) fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        normalize_code, normalize_optional, validate_code, validate_email, validate_name,
        ValidationError,
    };

    #[test]
    fn code_rules_accept_slugs_and_reject_the_rest() {
        assert!(validate_code("color").is_ok());
        assert!(validate_code("a1_b-2").is_ok());
        assert!(validate_code("_leading").is_err());
        assert!(validate_code("has space").is_err());
        assert!(validate_code("").is_err());
        assert!(validate_code(&"x".repeat(65)).is_err());
        assert_eq!(normalize_code("  Color "), "color");
    }

    #[test]
    fn name_rules_reject_blank_and_oversized() {
        assert_eq!(validate_name("   "), Err(ValidationError::BlankName));
        assert!(matches!(
            validate_name(&"n".repeat(201)),
            Err(ValidationError::NameTooLong { max: 200, actual: 201 })
        ));
    }

    #[test]
    fn email_requires_single_at_with_both_parts() {
        assert!(validate_email("ops@acme.test").is_ok());
        assert!(validate_email("ops@").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn optional_blank_maps_to_none() {
        assert_eq!(normalize_optional(Some("  ")), None);
        assert_eq!(normalize_optional(Some(" x ")), Some("x".to_string()));
        assert_eq!(normalize_optional(None), None);
    }
}
