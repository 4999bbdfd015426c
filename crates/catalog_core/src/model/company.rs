//! Company domain model.
//!
//! A company owns products. `is_active` is an operational switch separate from
//! the soft-delete tombstone: inactive companies stay visible but cannot take
//! new products.

use crate::model::common::{validate_code, validate_email, validate_name, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable company identifier.
pub type CompanyId = Uuid;

/// Company record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub uuid: CompanyId,
    pub code: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Company {
    /// Creates an active company with a generated id.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
            email: None,
            phone: None,
            website: None,
            is_active: true,
            is_deleted: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_code(&self.code)?;
        if let Some(email) = self.email.as_deref() {
            validate_email(email)?;
        }
        Ok(())
    }
}
