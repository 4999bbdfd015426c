//! Product use-case service.
//!
//! # Responsibility
//! - Check product attribute values against the product type's attribute
//!   definitions before persistence.
//!
//! # Invariants
//! - Every value targets an attribute linked to the product's type.
//! - Every value is accepted by its attribute kind.
//! - Every required linked attribute has a value.

use crate::model::common::{normalize_code, normalize_name, EntityKind};
use crate::model::company::CompanyId;
use crate::model::product::{Product, ProductAttributeValue, ProductId};
use crate::model::product_type::ProductTypeId;
use crate::repo::attribute_repo::AttributeRepository;
use crate::repo::common::normalize_list_limit;
use crate::repo::product_repo::{ProductListQuery, ProductRepository};
use crate::repo::product_type_repo::ProductTypeRepository;
use crate::service::{log_outcome, not_found, ListPage, ServiceError, ServiceResult};

const MODULE: &str = "product_service";

/// Request model for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    pub company_uuid: CompanyId,
    pub product_type_uuid: ProductTypeId,
    pub attribute_values: Vec<ProductAttributeValue>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateProductRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub company_uuid: Option<CompanyId>,
    pub product_type_uuid: Option<ProductTypeId>,
    /// Replaces all stored values.
    pub attribute_values: Option<Vec<ProductAttributeValue>>,
}

/// Product service facade over product, product type and attribute storage.
pub struct ProductService<P, T, A>
where
    P: ProductRepository,
    T: ProductTypeRepository,
    A: AttributeRepository,
{
    products: P,
    product_types: T,
    attributes: A,
}

impl<P, T, A> ProductService<P, T, A>
where
    P: ProductRepository,
    T: ProductTypeRepository,
    A: AttributeRepository,
{
    pub fn new(products: P, product_types: T, attributes: A) -> Self {
        Self {
            products,
            product_types,
            attributes,
        }
    }

    pub fn create(&self, request: CreateProductRequest) -> ServiceResult<Product> {
        let mut product = Product::new(
            normalize_code(&request.sku),
            normalize_name(&request.name),
            request.company_uuid,
            request.product_type_uuid,
        );
        product.attribute_values = normalize_values(request.attribute_values);

        let result = self.create_inner(&product);
        log_outcome("product_create", MODULE, product.uuid, &result);
        result
    }

    pub fn update(&self, id: ProductId, request: UpdateProductRequest) -> ServiceResult<Product> {
        let result = self.update_inner(id, request);
        log_outcome("product_update", MODULE, id, &result);
        result
    }

    pub fn get(&self, id: ProductId) -> ServiceResult<Product> {
        self.products
            .get_product(id, false)?
            .ok_or_else(|| not_found(EntityKind::Product, id))
    }

    pub fn list(&self, mut query: ProductListQuery) -> ServiceResult<ListPage<Product>> {
        let applied_limit = normalize_list_limit(query.limit);
        query.limit = Some(applied_limit);
        let items = self.products.list_products(&query)?;
        Ok(ListPage {
            items,
            applied_limit,
            offset: query.offset,
        })
    }

    pub fn delete(&self, id: ProductId) -> ServiceResult<()> {
        let result = self.products.soft_delete_product(id).map_err(Into::into);
        log_outcome("product_delete", MODULE, id, &result);
        result
    }

    /// Restores a product; its company must be active and its type restored.
    pub fn restore(&self, id: ProductId) -> ServiceResult<Product> {
        let result = self
            .products
            .restore_product(id)
            .map_err(ServiceError::from)
            .and_then(|()| self.read_back(id, "restored product not found in read-back"));
        log_outcome("product_restore", MODULE, id, &result);
        result
    }

    fn create_inner(&self, product: &Product) -> ServiceResult<Product> {
        product.validate()?;
        self.check_values(product)?;
        let id = self.products.create_product(product)?;
        self.read_back(id, "created product not found in read-back")
    }

    fn update_inner(&self, id: ProductId, request: UpdateProductRequest) -> ServiceResult<Product> {
        let mut product = self.get(id)?;
        if let Some(sku) = request.sku {
            product.sku = normalize_code(&sku);
        }
        if let Some(name) = request.name {
            product.name = normalize_name(&name);
        }
        if let Some(company_uuid) = request.company_uuid {
            product.company_uuid = company_uuid;
        }
        if let Some(product_type_uuid) = request.product_type_uuid {
            product.product_type_uuid = product_type_uuid;
        }
        if let Some(values) = request.attribute_values {
            product.attribute_values = normalize_values(values);
        }

        product.validate()?;
        self.check_values(&product)?;
        self.products.update_product(&product)?;
        self.read_back(id, "updated product not found in read-back")
    }

    fn check_values(&self, product: &Product) -> ServiceResult<()> {
        let product_type = self
            .product_types
            .get_product_type(product.product_type_uuid, false)?
            .ok_or(ServiceError::MissingReference {
                entity: EntityKind::ProductType,
                id: product.product_type_uuid,
            })?;

        for value in &product.attribute_values {
            if !product_type.attribute_ids.contains(&value.attribute_uuid) {
                return Err(ServiceError::MissingReference {
                    entity: EntityKind::Attribute,
                    id: value.attribute_uuid,
                });
            }
        }

        for attribute_id in &product_type.attribute_ids {
            let attribute = self
                .attributes
                .get_attribute(*attribute_id, false)?
                .ok_or(ServiceError::MissingReference {
                    entity: EntityKind::Attribute,
                    id: *attribute_id,
                })?;
            match product.value_of(attribute.uuid) {
                Some(value) if !attribute.accepts(value) => {
                    return Err(ServiceError::InvalidValue {
                        attribute: attribute.uuid,
                        value: value.to_string(),
                    });
                }
                None if attribute.is_required => {
                    return Err(ServiceError::MissingRequiredValue {
                        attribute: attribute.uuid,
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn read_back(&self, id: ProductId, details: &'static str) -> ServiceResult<Product> {
        self.products
            .get_product(id, false)?
            .ok_or(ServiceError::InconsistentState(details))
    }
}

fn normalize_values(values: Vec<ProductAttributeValue>) -> Vec<ProductAttributeValue> {
    values
        .into_iter()
        .map(|value| ProductAttributeValue {
            attribute_uuid: value.attribute_uuid,
            value: value.value.trim().to_string(),
        })
        .collect()
}
