//! Product domain model.
//!
//! Products are the referrers behind every delete guard in this crate: a
//! company, product type or attribute stays deletable only while no active
//! product points at it.

use crate::model::attribute::AttributeId;
use crate::model::common::{validate_code, validate_name, ValidationError};
use crate::model::company::CompanyId;
use crate::model::product_type::ProductTypeId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Stable product identifier.
pub type ProductId = Uuid;

/// One attribute value stored on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttributeValue {
    pub attribute_uuid: AttributeId,
    pub value: String,
}

/// Product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub uuid: ProductId,
    /// Stock keeping unit; follows code rules.
    pub sku: String,
    pub name: String,
    pub company_uuid: CompanyId,
    pub product_type_uuid: ProductTypeId,
    /// Sorted by attribute id on read.
    pub attribute_values: Vec<ProductAttributeValue>,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Creates a product with no attribute values.
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        company_uuid: CompanyId,
        product_type_uuid: ProductTypeId,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            sku: sku.into(),
            name: name.into(),
            company_uuid,
            product_type_uuid,
            attribute_values: Vec::new(),
            is_deleted: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_code(&self.sku)?;
        let mut seen = HashSet::new();
        for value in &self.attribute_values {
            if !seen.insert(value.attribute_uuid) {
                return Err(ValidationError::DuplicateAttribute(value.attribute_uuid));
            }
        }
        Ok(())
    }

    /// Returns the stored value for one attribute.
    pub fn value_of(&self, attribute_uuid: AttributeId) -> Option<&str> {
        self.attribute_values
            .iter()
            .find(|value| value.attribute_uuid == attribute_uuid)
            .map(|value| value.value.as_str())
    }
}
