//! Company use-case service.
//!
//! # Invariants
//! - Blank optional contact fields are stored as `NULL`.
//! - Delete is refused while the company owns active products.
//! - Deactivation is always allowed; it only blocks new product writes.

use crate::model::common::{normalize_code, normalize_name, normalize_optional, EntityKind};
use crate::model::company::{Company, CompanyId};
use crate::repo::common::normalize_list_limit;
use crate::repo::company_repo::{CompanyListQuery, CompanyRepository};
use crate::service::{log_outcome, not_found, ListPage, ServiceError, ServiceResult};

const MODULE: &str = "company_service";

/// Request model for creating a company.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateCompanyRequest {
    pub code: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

/// Partial update; `None` keeps the stored value, `Some("")` clears an
/// optional contact field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateCompanyRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

/// Company service facade.
pub struct CompanyService<R: CompanyRepository> {
    repo: R,
}

impl<R: CompanyRepository> CompanyService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create(&self, request: CreateCompanyRequest) -> ServiceResult<Company> {
        let mut company =
            Company::new(normalize_code(&request.code), normalize_name(&request.name));
        company.email = normalize_optional(request.email.as_deref());
        company.phone = normalize_optional(request.phone.as_deref());
        company.website = normalize_optional(request.website.as_deref());

        let result = self.create_inner(&company);
        log_outcome("company_create", MODULE, company.uuid, &result);
        result
    }

    pub fn update(&self, id: CompanyId, request: UpdateCompanyRequest) -> ServiceResult<Company> {
        let result = self.update_inner(id, request);
        log_outcome("company_update", MODULE, id, &result);
        result
    }

    pub fn get(&self, id: CompanyId) -> ServiceResult<Company> {
        self.repo
            .get_company(id, false)?
            .ok_or_else(|| not_found(EntityKind::Company, id))
    }

    pub fn list(&self, mut query: CompanyListQuery) -> ServiceResult<ListPage<Company>> {
        let applied_limit = normalize_list_limit(query.limit);
        query.limit = Some(applied_limit);
        let items = self.repo.list_companies(&query)?;
        Ok(ListPage {
            items,
            applied_limit,
            offset: query.offset,
        })
    }

    /// Re-enables product writes for the company.
    pub fn activate(&self, id: CompanyId) -> ServiceResult<Company> {
        let result = self.set_active(id, true);
        log_outcome("company_activate", MODULE, id, &result);
        result
    }

    /// Blocks new product writes for the company.
    pub fn deactivate(&self, id: CompanyId) -> ServiceResult<Company> {
        let result = self.set_active(id, false);
        log_outcome("company_deactivate", MODULE, id, &result);
        result
    }

    /// Soft-deletes a company unless it still owns active products.
    pub fn delete(&self, id: CompanyId) -> ServiceResult<()> {
        let result = self.repo.soft_delete_company(id).map_err(Into::into);
        log_outcome("company_delete", MODULE, id, &result);
        result
    }

    pub fn restore(&self, id: CompanyId) -> ServiceResult<Company> {
        let result = self
            .repo
            .restore_company(id)
            .map_err(ServiceError::from)
            .and_then(|()| self.read_back(id, "restored company not found in read-back"));
        log_outcome("company_restore", MODULE, id, &result);
        result
    }

    /// Number of active products owned by the company.
    pub fn product_count(&self, id: CompanyId) -> ServiceResult<u32> {
        self.get(id)?;
        Ok(self.repo.count_company_products(id)?)
    }

    fn create_inner(&self, company: &Company) -> ServiceResult<Company> {
        company.validate()?;
        let id = self.repo.create_company(company)?;
        self.read_back(id, "created company not found in read-back")
    }

    fn update_inner(&self, id: CompanyId, request: UpdateCompanyRequest) -> ServiceResult<Company> {
        let mut company = self.get(id)?;
        if let Some(code) = request.code {
            company.code = normalize_code(&code);
        }
        if let Some(name) = request.name {
            company.name = normalize_name(&name);
        }
        if let Some(email) = request.email {
            company.email = normalize_optional(Some(email.as_str()));
        }
        if let Some(phone) = request.phone {
            company.phone = normalize_optional(Some(phone.as_str()));
        }
        if let Some(website) = request.website {
            company.website = normalize_optional(Some(website.as_str()));
        }

        company.validate()?;
        self.repo.update_company(&company)?;
        self.read_back(id, "updated company not found in read-back")
    }

    fn set_active(&self, id: CompanyId, is_active: bool) -> ServiceResult<Company> {
        self.repo.set_company_active(id, is_active)?;
        self.read_back(id, "company missing after activation change")
    }

    fn read_back(&self, id: CompanyId, details: &'static str) -> ServiceResult<Company> {
        self.repo
            .get_company(id, false)?
            .ok_or(ServiceError::InconsistentState(details))
    }
}
