//! Product repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A product row is written only while its company is active and its
//!   product type is not deleted.
//! - Attribute values are only stored for attributes linked to the type.
//! - Restore re-checks every stored value against the type's current
//!   attribute definitions, including required ones.
//! - Product row and attribute values are written in one transaction.

use crate::model::common::EntityKind;
use crate::model::company::CompanyId;
use crate::model::product::{Product, ProductAttributeValue, ProductId};
use crate::model::product_type::ProductTypeId;
use crate::repo::attribute_repo::load_attribute;
use crate::repo::common::{
    bool_to_int, code_taken, ensure_connection_ready, parse_bool, parse_uuid, row_state,
    tombstone, ListSql, RepoError, RepoResult,
};
use crate::repo::product_type_repo::load_attribute_ids;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const TABLE: &str = "products";

const PRODUCT_COLUMNS: &[&str] = &[
    "uuid",
    "sku",
    "name",
    "company_uuid",
    "product_type_uuid",
    "is_deleted",
    "created_at",
    "updated_at",
];
const VALUE_COLUMNS: &[&str] = &["product_uuid", "attribute_uuid", "value"];

const PRODUCT_SELECT_SQL: &str = "SELECT
    uuid,
    sku,
    name,
    company_uuid,
    product_type_uuid,
    is_deleted,
    created_at,
    updated_at
FROM products";

/// Query options for listing products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductListQuery {
    /// Case-insensitive substring over name and sku.
    pub search: Option<String>,
    pub company_uuid: Option<CompanyId>,
    pub product_type_uuid: Option<ProductTypeId>,
    pub include_deleted: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for product operations.
pub trait ProductRepository {
    fn create_product(&self, product: &Product) -> RepoResult<ProductId>;
    fn update_product(&self, product: &Product) -> RepoResult<()>;
    fn get_product(&self, id: ProductId, include_deleted: bool) -> RepoResult<Option<Product>>;
    fn list_products(&self, query: &ProductListQuery) -> RepoResult<Vec<Product>>;
    /// Idempotent soft delete.
    fn soft_delete_product(&self, id: ProductId) -> RepoResult<()>;
    /// Restores a deleted product when its company, type and stored values
    /// are all valid again.
    fn restore_product(&self, id: ProductId) -> RepoResult<()>;
}

/// SQLite-backed product repository.
pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (TABLE, PRODUCT_COLUMNS),
                ("product_attribute_values", VALUE_COLUMNS),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn create_product(&self, product: &Product) -> RepoResult<ProductId> {
        product.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if code_taken(&tx, TABLE, "sku", &product.sku, product.uuid)? {
            return Err(RepoError::Conflict {
                entity: EntityKind::Product,
                code: product.sku.clone(),
            });
        }
        ensure_references(&tx, product.company_uuid, product.product_type_uuid)?;
        ensure_values_linked(&tx, product)?;

        tx.execute(
            "INSERT INTO products (
                uuid,
                sku,
                name,
                company_uuid,
                product_type_uuid,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                product.uuid.to_string(),
                product.sku.as_str(),
                product.name.as_str(),
                product.company_uuid.to_string(),
                product.product_type_uuid.to_string(),
                bool_to_int(product.is_deleted),
            ],
        )?;
        replace_values(&tx, product)?;

        tx.commit()?;
        Ok(product.uuid)
    }

    fn update_product(&self, product: &Product) -> RepoResult<()> {
        product.validate()?;
        let id = product.uuid;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if row_state(&tx, TABLE, id)? != Some(false) {
            return Err(RepoError::NotFound {
                entity: EntityKind::Product,
                id,
            });
        }
        if code_taken(&tx, TABLE, "sku", &product.sku, id)? {
            return Err(RepoError::Conflict {
                entity: EntityKind::Product,
                code: product.sku.clone(),
            });
        }
        ensure_references(&tx, product.company_uuid, product.product_type_uuid)?;
        ensure_values_linked(&tx, product)?;

        tx.execute(
            "UPDATE products
             SET
                sku = ?2,
                name = ?3,
                company_uuid = ?4,
                product_type_uuid = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                product.sku.as_str(),
                product.name.as_str(),
                product.company_uuid.to_string(),
                product.product_type_uuid.to_string(),
            ],
        )?;
        replace_values(&tx, product)?;

        tx.commit()?;
        Ok(())
    }

    fn get_product(&self, id: ProductId, include_deleted: bool) -> RepoResult<Option<Product>> {
        load_product(self.conn, id, include_deleted)
    }

    fn list_products(&self, query: &ProductListQuery) -> RepoResult<Vec<Product>> {
        let mut sql = ListSql::new(PRODUCT_SELECT_SQL);
        sql.exclude_deleted("is_deleted", query.include_deleted);
        sql.search(query.search.as_deref(), &["name", "sku"]);
        if let Some(company_uuid) = query.company_uuid {
            sql.eq("company_uuid", Value::Text(company_uuid.to_string()));
        }
        if let Some(product_type_uuid) = query.product_type_uuid {
            sql.eq("product_type_uuid", Value::Text(product_type_uuid.to_string()));
        }
        let (sql, binds) = sql.finish(
            "name COLLATE NOCASE ASC, uuid ASC",
            query.limit,
            query.offset,
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut products = Vec::new();
        while let Some(row) = rows.next()? {
            products.push(parse_product_row(self.conn, row)?);
        }

        Ok(products)
    }

    fn soft_delete_product(&self, id: ProductId) -> RepoResult<()> {
        if row_state(self.conn, TABLE, id)?.is_none() {
            return Err(RepoError::NotFound {
                entity: EntityKind::Product,
                id,
            });
        }
        tombstone(self.conn, TABLE, id)
    }

    fn restore_product(&self, id: ProductId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(product) = load_product(&tx, id, true)? else {
            return Err(RepoError::NotFound {
                entity: EntityKind::Product,
                id,
            });
        };
        if !product.is_deleted {
            return Err(RepoError::NotDeleted {
                entity: EntityKind::Product,
                id,
            });
        }
        ensure_references(&tx, product.company_uuid, product.product_type_uuid)?;
        ensure_values_valid(&tx, &product)?;

        tx.execute(
            "UPDATE products
             SET is_deleted = 0,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        tx.commit()?;
        Ok(())
    }
}

fn ensure_references(
    conn: &Connection,
    company_uuid: CompanyId,
    product_type_uuid: ProductTypeId,
) -> RepoResult<()> {
    let company_usable: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM companies
            WHERE uuid = ?1
              AND is_deleted = 0
              AND is_active = 1
        );",
        [company_uuid.to_string()],
        |row| row.get(0),
    )?;
    if company_usable != 1 {
        return Err(RepoError::MissingReference {
            entity: EntityKind::Company,
            id: company_uuid,
        });
    }

    if row_state(conn, "product_types", product_type_uuid)? != Some(false) {
        return Err(RepoError::MissingReference {
            entity: EntityKind::ProductType,
            id: product_type_uuid,
        });
    }
    Ok(())
}

fn ensure_values_linked(conn: &Connection, product: &Product) -> RepoResult<()> {
    let linked = load_attribute_ids(conn, product.product_type_uuid)?;
    for value in &product.attribute_values {
        if !linked.contains(&value.attribute_uuid) {
            return Err(RepoError::MissingReference {
                entity: EntityKind::Attribute,
                id: value.attribute_uuid,
            });
        }
    }
    Ok(())
}

/// Checks stored values against the type's current attribute definitions.
fn ensure_values_valid(conn: &Connection, product: &Product) -> RepoResult<()> {
    ensure_values_linked(conn, product)?;
    for attribute_id in load_attribute_ids(conn, product.product_type_uuid)? {
        let attribute =
            load_attribute(conn, attribute_id, false)?.ok_or(RepoError::MissingReference {
                entity: EntityKind::Attribute,
                id: attribute_id,
            })?;
        match product.value_of(attribute_id) {
            Some(value) if !attribute.accepts(value) => {
                return Err(RepoError::InvalidValue {
                    attribute: attribute_id,
                    value: value.to_string(),
                });
            }
            None if attribute.is_required => {
                return Err(RepoError::MissingRequiredValue {
                    attribute: attribute_id,
                });
            }
            _ => {}
        }
    }
    Ok(())
}

fn replace_values(conn: &Connection, product: &Product) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM product_attribute_values WHERE product_uuid = ?1;",
        [product.uuid.to_string()],
    )?;
    for value in &product.attribute_values {
        conn.execute(
            "INSERT INTO product_attribute_values (product_uuid, attribute_uuid, value)
             VALUES (?1, ?2, ?3);",
            params![
                product.uuid.to_string(),
                value.attribute_uuid.to_string(),
                value.value.as_str(),
            ],
        )?;
    }
    Ok(())
}

fn load_product(
    conn: &Connection,
    id: ProductId,
    include_deleted: bool,
) -> RepoResult<Option<Product>> {
    let mut stmt = conn.prepare(&format!(
        "{PRODUCT_SELECT_SQL}
         WHERE uuid = ?1
           AND (?2 = 1 OR is_deleted = 0);"
    ))?;

    let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_product_row(conn, row)?));
    }

    Ok(None)
}

fn load_values(conn: &Connection, id: ProductId) -> RepoResult<Vec<ProductAttributeValue>> {
    let mut stmt = conn.prepare(
        "SELECT attribute_uuid, value
         FROM product_attribute_values
         WHERE product_uuid = ?1
         ORDER BY attribute_uuid ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        let attribute_text: String = row.get(0)?;
        values.push(ProductAttributeValue {
            attribute_uuid: parse_uuid(&attribute_text, "product_attribute_values.attribute_uuid")?,
            value: row.get(1)?,
        });
    }
    Ok(values)
}

fn parse_product_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Product> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "products.uuid")?;
    let company_text: String = row.get("company_uuid")?;
    let type_text: String = row.get("product_type_uuid")?;

    let product = Product {
        uuid,
        sku: row.get("sku")?,
        name: row.get("name")?,
        company_uuid: parse_uuid(&company_text, "products.company_uuid")?,
        product_type_uuid: parse_uuid(&type_text, "products.product_type_uuid")?,
        attribute_values: load_values(conn, uuid)?,
        is_deleted: parse_bool(row.get("is_deleted")?, "products.is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    product.validate()?;
    Ok(product)
}
