//! Attribute domain model.
//!
//! # Responsibility
//! - Define the typed product attribute shared across product types.
//! - Decide which raw product values an attribute kind accepts.
//!
//! # Invariants
//! - `options` is non-empty only for `AttributeKind::Select`.
//! - Options are trimmed and unique case-insensitively.

use crate::model::common::{validate_code, validate_name, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable attribute identifier.
pub type AttributeId = Uuid;

/// Value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Free text.
    Text,
    /// Finite decimal number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// One value out of `options`.
    Select,
}

impl AttributeKind {
    /// Stable storage label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Select => "select",
        }
    }

    /// Parses a storage label.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "boolean" | "bool" => Some(Self::Boolean),
            "select" => Some(Self::Select),
            _ => None,
        }
    }

    /// Returns whether `value` is a legal product value for this kind.
    pub fn accepts(self, value: &str, options: &[String]) -> bool {
        match self {
            Self::Text => !value.trim().is_empty(),
            Self::Number => value
                .trim()
                .parse::<f64>()
                .map(f64::is_finite)
                .unwrap_or(false),
            Self::Boolean => matches!(value.trim(), "true" | "false"),
            Self::Select => options.iter().any(|option| option == value.trim()),
        }
    }
}

impl Display for AttributeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub uuid: AttributeId,
    /// Unique machine code, lowercase.
    pub code: String,
    pub name: String,
    pub kind: AttributeKind,
    /// Allowed values, in display order. Select kind only.
    pub options: Vec<String>,
    /// Products of linked types must carry a value.
    pub is_required: bool,
    /// Exposed as a listing filter to storefront callers.
    pub is_filterable: bool,
    pub is_deleted: bool,
    /// Epoch ms, assigned by storage.
    pub created_at: i64,
    /// Epoch ms, assigned by storage.
    pub updated_at: i64,
}

impl Attribute {
    /// Creates an active attribute with a generated id.
    pub fn new(code: impl Into<String>, name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
            kind,
            options: Vec::new(),
            is_required: false,
            is_filterable: false,
            is_deleted: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Checks name, code and option rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_code(&self.code)?;

        if self.kind == AttributeKind::Select {
            if self.options.is_empty() {
                return Err(ValidationError::SelectWithoutOptions);
            }
        } else if !self.options.is_empty() {
            return Err(ValidationError::OptionsNotAllowed(self.kind.as_str()));
        }

        let mut seen = HashSet::new();
        for option in &self.options {
            if option.trim().is_empty() {
                return Err(ValidationError::BlankOption);
            }
            if !seen.insert(option.to_lowercase()) {
                return Err(ValidationError::DuplicateOption(option.clone()));
            }
        }
        Ok(())
    }

    /// Returns whether `value` is acceptable for this attribute.
    pub fn accepts(&self, value: &str) -> bool {
        self.kind.accepts(value, &self.options)
    }
}

/// Trims option values and drops blanks, preserving order.
pub fn normalize_options(options: &[String]) -> Vec<String> {
    options
        .iter()
        .map(|option| option.trim())
        .filter(|option| !option.is_empty())
        .map(str::to_string)
        .collect()
}
