//! Attribute use-case service.
//!
//! # Responsibility
//! - Normalize attribute requests (code case, option whitespace).
//! - Provide create/update/get/list/delete/restore entry points.
//!
//! # Invariants
//! - Delete is refused while active products store values for the attribute.
//! - Every mutating call logs an `attribute_*` event.

use crate::model::attribute::{normalize_options, Attribute, AttributeId, AttributeKind};
use crate::model::common::{normalize_code, normalize_name, EntityKind};
use crate::repo::attribute_repo::{AttributeListQuery, AttributeRepository};
use crate::repo::common::normalize_list_limit;
use crate::service::{log_outcome, not_found, ListPage, ServiceError, ServiceResult};

const MODULE: &str = "attribute_service";

/// Request model for creating an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAttributeRequest {
    pub code: String,
    pub name: String,
    pub kind: AttributeKind,
    /// Select kind only.
    pub options: Vec<String>,
    pub is_required: bool,
    pub is_filterable: bool,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateAttributeRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub kind: Option<AttributeKind>,
    /// Replaces the full option list.
    pub options: Option<Vec<String>>,
    pub is_required: Option<bool>,
    pub is_filterable: Option<bool>,
}

/// Attribute service facade over repository implementations.
pub struct AttributeService<R: AttributeRepository> {
    repo: R,
}

impl<R: AttributeRepository> AttributeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one attribute and returns the stored record.
    pub fn create(&self, request: CreateAttributeRequest) -> ServiceResult<Attribute> {
        let mut attribute = Attribute::new(
            normalize_code(&request.code),
            normalize_name(&request.name),
            request.kind,
        );
        attribute.options = normalize_options(&request.options);
        attribute.is_required = request.is_required;
        attribute.is_filterable = request.is_filterable;

        let result = self.create_inner(&attribute);
        log_outcome("attribute_create", MODULE, attribute.uuid, &result);
        result
    }

    /// Applies a partial update to an active attribute.
    ///
    /// Switching `kind` away from the stored kind, or dropping options that
    /// products still use, is refused with `InUse`.
    pub fn update(
        &self,
        id: AttributeId,
        request: UpdateAttributeRequest,
    ) -> ServiceResult<Attribute> {
        let result = self.update_inner(id, request);
        log_outcome("attribute_update", MODULE, id, &result);
        result
    }

    /// Gets one active attribute.
    pub fn get(&self, id: AttributeId) -> ServiceResult<Attribute> {
        self.repo
            .get_attribute(id, false)?
            .ok_or_else(|| not_found(EntityKind::Attribute, id))
    }

    /// Lists attributes with search, filters and pagination.
    pub fn list(&self, mut query: AttributeListQuery) -> ServiceResult<ListPage<Attribute>> {
        let applied_limit = normalize_list_limit(query.limit);
        query.limit = Some(applied_limit);
        let items = self.repo.list_attributes(&query)?;
        Ok(ListPage {
            items,
            applied_limit,
            offset: query.offset,
        })
    }

    /// Soft-deletes an attribute unless products still use it.
    pub fn delete(&self, id: AttributeId) -> ServiceResult<()> {
        let result = self.repo.soft_delete_attribute(id).map_err(Into::into);
        log_outcome("attribute_delete", MODULE, id, &result);
        result
    }

    /// Restores a soft-deleted attribute. Product type links are not restored.
    pub fn restore(&self, id: AttributeId) -> ServiceResult<Attribute> {
        let result = self
            .repo
            .restore_attribute(id)
            .map_err(ServiceError::from)
            .and_then(|()| self.read_back(id, "restored attribute not found in read-back"));
        log_outcome("attribute_restore", MODULE, id, &result);
        result
    }

    /// Number of active products storing a value for the attribute.
    pub fn product_count(&self, id: AttributeId) -> ServiceResult<u32> {
        self.get(id)?;
        Ok(self.repo.count_attribute_products(id)?)
    }

    fn create_inner(&self, attribute: &Attribute) -> ServiceResult<Attribute> {
        attribute.validate()?;
        let id = self.repo.create_attribute(attribute)?;
        self.read_back(id, "created attribute not found in read-back")
    }

    fn update_inner(
        &self,
        id: AttributeId,
        request: UpdateAttributeRequest,
    ) -> ServiceResult<Attribute> {
        let mut attribute = self.get(id)?;
        if let Some(code) = request.code {
            attribute.code = normalize_code(&code);
        }
        if let Some(name) = request.name {
            attribute.name = normalize_name(&name);
        }
        if let Some(kind) = request.kind {
            attribute.kind = kind;
            if kind != AttributeKind::Select && request.options.is_none() {
                attribute.options.clear();
            }
        }
        if let Some(options) = request.options {
            attribute.options = normalize_options(&options);
        }
        if let Some(is_required) = request.is_required {
            attribute.is_required = is_required;
        }
        if let Some(is_filterable) = request.is_filterable {
            attribute.is_filterable = is_filterable;
        }

        attribute.validate()?;
        self.repo.update_attribute(&attribute)?;
        self.read_back(id, "updated attribute not found in read-back")
    }

    fn read_back(&self, id: AttributeId, details: &'static str) -> ServiceResult<Attribute> {
        self.repo
            .get_attribute(id, false)?
            .ok_or(ServiceError::InconsistentState(details))
    }
}
