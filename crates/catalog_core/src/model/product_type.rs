//! Product type domain model.
//!
//! # Invariants
//! - `attribute_ids` holds each attribute at most once, in display order.

use crate::model::attribute::AttributeId;
use crate::model::common::{validate_code, validate_name, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Stable product type identifier.
pub type ProductTypeId = Uuid;

/// Product type record with its linked attribute set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductType {
    pub uuid: ProductTypeId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Linked attributes, in display order.
    pub attribute_ids: Vec<AttributeId>,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ProductType {
    /// Creates a product type with no linked attributes.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
            description: None,
            attribute_ids: Vec::new(),
            is_deleted: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_code(&self.code)?;
        validate_unique_attributes(&self.attribute_ids)
    }
}

/// Rejects attribute lists that mention one id twice.
pub fn validate_unique_attributes(ids: &[AttributeId]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(*id) {
            return Err(ValidationError::DuplicateAttribute(*id));
        }
    }
    Ok(())
}
