//! Catalog use-case services.
//!
//! # Responsibility
//! - Turn request models into validated entities and repository calls.
//! - Map repository failures to caller-facing `ServiceError`s.
//! - Log one metadata-only lifecycle event per mutating call.
//!
//! # Invariants
//! - Services never bypass repository validation or guards.
//! - Log lines carry ids and error codes only, never entity contents.

use crate::model::attribute::AttributeId;
use crate::model::common::{EntityKind, ValidationError};
use crate::repo::common::RepoError;
use log::{error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod attribute_service;
pub mod company_service;
pub mod product_service;
pub mod product_type_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing error for catalog use-cases.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    NotFound {
        entity: EntityKind,
        id: Uuid,
    },
    NotDeleted {
        entity: EntityKind,
        id: Uuid,
    },
    Conflict {
        entity: EntityKind,
        code: String,
    },
    /// Delete/redefinition blocked by active products.
    InUse {
        entity: EntityKind,
        id: Uuid,
        product_count: u32,
    },
    MissingReference {
        entity: EntityKind,
        id: Uuid,
    },
    /// Product value rejected by the attribute kind.
    InvalidValue {
        attribute: AttributeId,
        value: String,
    },
    /// Required attribute has no product value.
    MissingRequiredValue {
        attribute: AttributeId,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Write succeeded but read-back disagrees.
    InconsistentState(&'static str),
}

impl ServiceError {
    /// Stable machine code for logs and CLI exit reporting.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::NotFound { .. } => "not_found",
            Self::NotDeleted { .. } => "not_deleted",
            Self::Conflict { .. } => "code_conflict",
            Self::InUse { .. } => "in_use",
            Self::MissingReference { .. } => "missing_reference",
            Self::InvalidValue { .. } => "invalid_value",
            Self::MissingRequiredValue { .. } => "missing_required_value",
            Self::Repo(_) => "storage_failed",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }

    /// True when a business rule refused the request, false for failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Repo(_) | Self::InconsistentState(_))
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::NotDeleted { entity, id } => write!(f, "{entity} is not deleted: {id}"),
            Self::Conflict { entity, code } => {
                write!(f, "{entity} code `{code}` is already in use")
            }
            Self::InUse {
                entity,
                id,
                product_count,
            } => write!(
                f,
                "cannot change {entity} {id}: still referenced by {product_count} active product(s)"
            ),
            Self::MissingReference { entity, id } => {
                write!(f, "referenced {entity} is missing or inactive: {id}")
            }
            Self::InvalidValue { attribute, value } => {
                write!(f, "value `{value}` is not valid for attribute {attribute}")
            }
            Self::MissingRequiredValue { attribute } => {
                write!(f, "required attribute {attribute} has no value")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent catalog state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::NotDeleted { entity, id } => Self::NotDeleted { entity, id },
            RepoError::Conflict { entity, code } => Self::Conflict { entity, code },
            RepoError::InUse {
                entity,
                id,
                product_count,
            } => Self::InUse {
                entity,
                id,
                product_count,
            },
            RepoError::MissingReference { entity, id } => Self::MissingReference { entity, id },
            RepoError::InvalidValue { attribute, value } => Self::InvalidValue { attribute, value },
            RepoError::MissingRequiredValue { attribute } => {
                Self::MissingRequiredValue { attribute }
            }
            other => Self::Repo(other),
        }
    }
}

/// List result envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListPage<T> {
    /// Items sorted by `name ASC, uuid ASC`.
    pub items: Vec<T>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
    pub offset: u32,
}

/// Emits the lifecycle event for one mutating call.
///
/// Rejections log at `warn`, storage failures at `error`.
pub(crate) fn log_outcome<T>(
    event: &'static str,
    module: &'static str,
    id: Uuid,
    result: &ServiceResult<T>,
) {
    match result {
        Ok(_) => info!("event={event} module={module} status=ok id={id}"),
        Err(err) if err.is_rejection() => warn!(
            "event={event} module={module} status=rejected id={id} error_code={}",
            err.code()
        ),
        Err(err) => error!(
            "event={event} module={module} status=error id={id} error_code={} error={err}",
            err.code()
        ),
    }
}

pub(crate) fn not_found(entity: EntityKind, id: Uuid) -> ServiceError {
    ServiceError::NotFound { entity, id }
}
