//! Company repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Soft delete fails while any active product belongs to the company.
//! - `is_active` toggling applies only to non-deleted rows.

use crate::model::common::EntityKind;
use crate::model::company::{Company, CompanyId};
use crate::repo::common::{
    bool_to_int, code_taken, ensure_connection_ready, parse_bool, parse_uuid, restore_row,
    row_state, tombstone, ListSql, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const TABLE: &str = "companies";

const COMPANY_COLUMNS: &[&str] = &[
    "uuid",
    "code",
    "name",
    "email",
    "phone",
    "website",
    "is_active",
    "is_deleted",
    "created_at",
    "updated_at",
];

const COMPANY_SELECT_SQL: &str = "SELECT
    uuid,
    code,
    name,
    email,
    phone,
    website,
    is_active,
    is_deleted,
    created_at,
    updated_at
FROM companies";

/// Query options for listing companies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyListQuery {
    /// Case-insensitive substring over name and code.
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub include_deleted: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for company operations.
pub trait CompanyRepository {
    fn create_company(&self, company: &Company) -> RepoResult<CompanyId>;
    fn update_company(&self, company: &Company) -> RepoResult<()>;
    fn get_company(&self, id: CompanyId, include_deleted: bool) -> RepoResult<Option<Company>>;
    fn list_companies(&self, query: &CompanyListQuery) -> RepoResult<Vec<Company>>;
    fn set_company_active(&self, id: CompanyId, is_active: bool) -> RepoResult<()>;
    /// Guarded soft delete; idempotent for already-deleted rows.
    fn soft_delete_company(&self, id: CompanyId) -> RepoResult<()>;
    fn restore_company(&self, id: CompanyId) -> RepoResult<()>;
    /// Counts active products owned by the company.
    fn count_company_products(&self, id: CompanyId) -> RepoResult<u32>;
}

/// SQLite-backed company repository.
pub struct SqliteCompanyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCompanyRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[(TABLE, COMPANY_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl CompanyRepository for SqliteCompanyRepository<'_> {
    fn create_company(&self, company: &Company) -> RepoResult<CompanyId> {
        company.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if code_taken(&tx, TABLE, "code", &company.code, company.uuid)? {
            return Err(RepoError::Conflict {
                entity: EntityKind::Company,
                code: company.code.clone(),
            });
        }

        tx.execute(
            "INSERT INTO companies (
                uuid,
                code,
                name,
                email,
                phone,
                website,
                is_active,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                company.uuid.to_string(),
                company.code.as_str(),
                company.name.as_str(),
                company.email.as_deref(),
                company.phone.as_deref(),
                company.website.as_deref(),
                bool_to_int(company.is_active),
                bool_to_int(company.is_deleted),
            ],
        )?;

        tx.commit()?;
        Ok(company.uuid)
    }

    fn update_company(&self, company: &Company) -> RepoResult<()> {
        company.validate()?;
        let id = company.uuid;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if code_taken(&tx, TABLE, "code", &company.code, id)? {
            return Err(RepoError::Conflict {
                entity: EntityKind::Company,
                code: company.code.clone(),
            });
        }

        let changed = tx.execute(
            "UPDATE companies
             SET
                code = ?2,
                name = ?3,
                email = ?4,
                phone = ?5,
                website = ?6,
                is_active = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![
                id.to_string(),
                company.code.as_str(),
                company.name.as_str(),
                company.email.as_deref(),
                company.phone.as_deref(),
                company.website.as_deref(),
                bool_to_int(company.is_active),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Company,
                id,
            });
        }

        tx.commit()?;
        Ok(())
    }

    fn get_company(&self, id: CompanyId, include_deleted: bool) -> RepoResult<Option<Company>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPANY_SELECT_SQL}
             WHERE uuid = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_company_row(row)?));
        }

        Ok(None)
    }

    fn list_companies(&self, query: &CompanyListQuery) -> RepoResult<Vec<Company>> {
        let mut sql = ListSql::new(COMPANY_SELECT_SQL);
        sql.exclude_deleted("is_deleted", query.include_deleted);
        sql.search(query.search.as_deref(), &["name", "code"]);
        if let Some(is_active) = query.is_active {
            sql.eq("is_active", Value::Integer(bool_to_int(is_active)));
        }
        let (sql, binds) = sql.finish(
            "name COLLATE NOCASE ASC, uuid ASC",
            query.limit,
            query.offset,
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut companies = Vec::new();
        while let Some(row) = rows.next()? {
            companies.push(parse_company_row(row)?);
        }

        Ok(companies)
    }

    fn set_company_active(&self, id: CompanyId, is_active: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE companies
             SET
                is_active = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![id.to_string(), bool_to_int(is_active)],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Company,
                id,
            });
        }

        Ok(())
    }

    fn soft_delete_company(&self, id: CompanyId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        match row_state(&tx, TABLE, id)? {
            None => {
                return Err(RepoError::NotFound {
                    entity: EntityKind::Company,
                    id,
                })
            }
            Some(true) => return Ok(()),
            Some(false) => {}
        }

        let product_count = count_products(&tx, id)?;
        if product_count > 0 {
            return Err(RepoError::InUse {
                entity: EntityKind::Company,
                id,
                product_count,
            });
        }
        tombstone(&tx, TABLE, id)?;

        tx.commit()?;
        Ok(())
    }

    fn restore_company(&self, id: CompanyId) -> RepoResult<()> {
        restore_row(self.conn, EntityKind::Company, TABLE, id)
    }

    fn count_company_products(&self, id: CompanyId) -> RepoResult<u32> {
        count_products(self.conn, id)
    }
}

fn count_products(conn: &Connection, id: CompanyId) -> RepoResult<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*)
         FROM products
         WHERE company_uuid = ?1
           AND is_deleted = 0;",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn parse_company_row(row: &Row<'_>) -> RepoResult<Company> {
    let uuid_text: String = row.get("uuid")?;
    let company = Company {
        uuid: parse_uuid(&uuid_text, "companies.uuid")?,
        code: row.get("code")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        website: row.get("website")?,
        is_active: parse_bool(row.get("is_active")?, "companies.is_active")?,
        is_deleted: parse_bool(row.get("is_deleted")?, "companies.is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    company.validate()?;
    Ok(company)
}
