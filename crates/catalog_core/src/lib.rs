//! Core domain logic for the product catalog admin backend.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CatalogConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::attribute::{Attribute, AttributeId, AttributeKind};
pub use model::common::{EntityKind, ValidationError};
pub use model::company::{Company, CompanyId};
pub use model::product::{Product, ProductAttributeValue, ProductId};
pub use model::product_type::{ProductType, ProductTypeId};
pub use repo::attribute_repo::{AttributeListQuery, AttributeRepository, SqliteAttributeRepository};
pub use repo::common::{RepoError, RepoResult};
pub use repo::company_repo::{CompanyListQuery, CompanyRepository, SqliteCompanyRepository};
pub use repo::product_repo::{ProductListQuery, ProductRepository, SqliteProductRepository};
pub use repo::product_type_repo::{
    ProductTypeListQuery, ProductTypeRepository, SqliteProductTypeRepository,
};
pub use service::attribute_service::{
    AttributeService, CreateAttributeRequest, UpdateAttributeRequest,
};
pub use service::company_service::{CompanyService, CreateCompanyRequest, UpdateCompanyRequest};
pub use service::product_service::{CreateProductRequest, ProductService, UpdateProductRequest};
pub use service::product_type_service::{
    CreateProductTypeRequest, ProductTypeService, UpdateProductTypeRequest,
};
pub use service::{ListPage, ServiceError, ServiceResult};
