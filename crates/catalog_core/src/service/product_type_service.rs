//! Product type use-case service.
//!
//! # Invariants
//! - Attribute links are replaced as a whole, never patched one by one.
//! - Delete is refused while active products use the type.

use crate::model::attribute::AttributeId;
use crate::model::common::{normalize_code, normalize_name, normalize_optional, EntityKind};
use crate::model::product_type::{validate_unique_attributes, ProductType, ProductTypeId};
use crate::repo::common::normalize_list_limit;
use crate::repo::product_type_repo::{ProductTypeListQuery, ProductTypeRepository};
use crate::service::{log_outcome, not_found, ListPage, ServiceError, ServiceResult};

const MODULE: &str = "product_type_service";

/// Request model for creating a product type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateProductTypeRequest {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Linked attributes in display order.
    pub attribute_ids: Vec<AttributeId>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateProductTypeRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
    /// Replaces the full linked set.
    pub attribute_ids: Option<Vec<AttributeId>>,
}

/// Product type service facade.
pub struct ProductTypeService<R: ProductTypeRepository> {
    repo: R,
}

impl<R: ProductTypeRepository> ProductTypeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create(&self, request: CreateProductTypeRequest) -> ServiceResult<ProductType> {
        let mut product_type =
            ProductType::new(normalize_code(&request.code), normalize_name(&request.name));
        product_type.description = normalize_optional(request.description.as_deref());
        product_type.attribute_ids = request.attribute_ids;

        let result = self.create_inner(&product_type);
        log_outcome("product_type_create", MODULE, product_type.uuid, &result);
        result
    }

    pub fn update(
        &self,
        id: ProductTypeId,
        request: UpdateProductTypeRequest,
    ) -> ServiceResult<ProductType> {
        let result = self.update_inner(id, request);
        log_outcome("product_type_update", MODULE, id, &result);
        result
    }

    pub fn get(&self, id: ProductTypeId) -> ServiceResult<ProductType> {
        self.repo
            .get_product_type(id, false)?
            .ok_or_else(|| not_found(EntityKind::ProductType, id))
    }

    pub fn list(&self, mut query: ProductTypeListQuery) -> ServiceResult<ListPage<ProductType>> {
        let applied_limit = normalize_list_limit(query.limit);
        query.limit = Some(applied_limit);
        let items = self.repo.list_product_types(&query)?;
        Ok(ListPage {
            items,
            applied_limit,
            offset: query.offset,
        })
    }

    /// Atomically replaces the linked attribute set.
    ///
    /// Unlinking an attribute that active products of this type still carry
    /// a value for is refused with `InUse`.
    pub fn set_attributes(
        &self,
        id: ProductTypeId,
        attribute_ids: Vec<AttributeId>,
    ) -> ServiceResult<ProductType> {
        let result = validate_unique_attributes(&attribute_ids)
            .map_err(ServiceError::from)
            .and_then(|()| {
                self.repo
                    .set_product_type_attributes(id, &attribute_ids)
                    .map_err(ServiceError::from)
            })
            .and_then(|()| self.read_back(id, "product type missing after attribute update"));
        log_outcome("product_type_set_attributes", MODULE, id, &result);
        result
    }

    /// Soft-deletes a product type unless products still use it.
    pub fn delete(&self, id: ProductTypeId) -> ServiceResult<()> {
        let result = self.repo.soft_delete_product_type(id).map_err(Into::into);
        log_outcome("product_type_delete", MODULE, id, &result);
        result
    }

    pub fn restore(&self, id: ProductTypeId) -> ServiceResult<ProductType> {
        let result = self
            .repo
            .restore_product_type(id)
            .map_err(ServiceError::from)
            .and_then(|()| self.read_back(id, "restored product type not found in read-back"));
        log_outcome("product_type_restore", MODULE, id, &result);
        result
    }

    /// Number of active products of this type.
    pub fn product_count(&self, id: ProductTypeId) -> ServiceResult<u32> {
        self.get(id)?;
        Ok(self.repo.count_product_type_products(id)?)
    }

    fn create_inner(&self, product_type: &ProductType) -> ServiceResult<ProductType> {
        product_type.validate()?;
        let id = self.repo.create_product_type(product_type)?;
        self.read_back(id, "created product type not found in read-back")
    }

    fn update_inner(
        &self,
        id: ProductTypeId,
        request: UpdateProductTypeRequest,
    ) -> ServiceResult<ProductType> {
        let mut product_type = self.get(id)?;
        if let Some(code) = request.code {
            product_type.code = normalize_code(&code);
        }
        if let Some(name) = request.name {
            product_type.name = normalize_name(&name);
        }
        if let Some(description) = request.description {
            product_type.description = normalize_optional(Some(description.as_str()));
        }
        if let Some(attribute_ids) = request.attribute_ids {
            product_type.attribute_ids = attribute_ids;
        }

        product_type.validate()?;
        self.repo.update_product_type(&product_type)?;
        self.read_back(id, "updated product type not found in read-back")
    }

    fn read_back(&self, id: ProductTypeId, details: &'static str) -> ServiceResult<ProductType> {
        self.repo
            .get_product_type(id, false)?
            .ok_or(ServiceError::InconsistentState(details))
    }
}
