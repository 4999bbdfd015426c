//! Product type repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist product types and their ordered attribute links.
//! - Replace attribute links atomically (`set_product_type_attributes`).
//!
//! # Invariants
//! - Linked attributes must exist and be active.
//! - An attribute cannot be unlinked while active products of the type store
//!   a value for it.
//! - A required attribute cannot be linked while the type has active products.
//! - Soft delete fails while any active product uses the type; links are kept
//!   so a restore brings the type back intact.

use crate::model::attribute::AttributeId;
use crate::model::common::EntityKind;
use crate::model::product_type::{validate_unique_attributes, ProductType, ProductTypeId};
use crate::repo::common::{
    bool_to_int, code_taken, ensure_connection_ready, parse_bool, parse_uuid, restore_row,
    row_state, tombstone, ListSql, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;

const TABLE: &str = "product_types";

const PRODUCT_TYPE_COLUMNS: &[&str] = &[
    "uuid",
    "code",
    "name",
    "description",
    "is_deleted",
    "created_at",
    "updated_at",
];
const LINK_COLUMNS: &[&str] = &["product_type_uuid", "attribute_uuid", "position"];

const PRODUCT_TYPE_SELECT_SQL: &str = "SELECT
    uuid,
    code,
    name,
    description,
    is_deleted,
    created_at,
    updated_at
FROM product_types";

/// Query options for listing product types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductTypeListQuery {
    /// Case-insensitive substring over name and code.
    pub search: Option<String>,
    /// Only types linked to this attribute.
    pub attribute_uuid: Option<AttributeId>,
    pub include_deleted: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for product type operations.
pub trait ProductTypeRepository {
    /// Inserts the type together with its attribute links.
    fn create_product_type(&self, product_type: &ProductType) -> RepoResult<ProductTypeId>;
    /// Rewrites an active type, attribute links included.
    fn update_product_type(&self, product_type: &ProductType) -> RepoResult<()>;
    fn get_product_type(
        &self,
        id: ProductTypeId,
        include_deleted: bool,
    ) -> RepoResult<Option<ProductType>>;
    fn list_product_types(&self, query: &ProductTypeListQuery) -> RepoResult<Vec<ProductType>>;
    /// Replaces the full ordered attribute set in one transaction.
    fn set_product_type_attributes(
        &self,
        id: ProductTypeId,
        attribute_ids: &[AttributeId],
    ) -> RepoResult<()>;
    /// Guarded soft delete; idempotent for already-deleted rows.
    fn soft_delete_product_type(&self, id: ProductTypeId) -> RepoResult<()>;
    fn restore_product_type(&self, id: ProductTypeId) -> RepoResult<()>;
    /// Counts active products of this type.
    fn count_product_type_products(&self, id: ProductTypeId) -> RepoResult<u32>;
}

/// SQLite-backed product type repository.
pub struct SqliteProductTypeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductTypeRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (TABLE, PRODUCT_TYPE_COLUMNS),
                ("product_type_attributes", LINK_COLUMNS),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ProductTypeRepository for SqliteProductTypeRepository<'_> {
    fn create_product_type(&self, product_type: &ProductType) -> RepoResult<ProductTypeId> {
        product_type.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if code_taken(&tx, TABLE, "code", &product_type.code, product_type.uuid)? {
            return Err(RepoError::Conflict {
                entity: EntityKind::ProductType,
                code: product_type.code.clone(),
            });
        }

        tx.execute(
            "INSERT INTO product_types (
                uuid,
                code,
                name,
                description,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                product_type.uuid.to_string(),
                product_type.code.as_str(),
                product_type.name.as_str(),
                product_type.description.as_deref(),
                bool_to_int(product_type.is_deleted),
            ],
        )?;
        apply_attribute_set(&tx, product_type.uuid, &product_type.attribute_ids)?;

        tx.commit()?;
        Ok(product_type.uuid)
    }

    fn update_product_type(&self, product_type: &ProductType) -> RepoResult<()> {
        product_type.validate()?;
        let id = product_type.uuid;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if code_taken(&tx, TABLE, "code", &product_type.code, id)? {
            return Err(RepoError::Conflict {
                entity: EntityKind::ProductType,
                code: product_type.code.clone(),
            });
        }

        let changed = tx.execute(
            "UPDATE product_types
             SET
                code = ?2,
                name = ?3,
                description = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![
                id.to_string(),
                product_type.code.as_str(),
                product_type.name.as_str(),
                product_type.description.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::ProductType,
                id,
            });
        }
        apply_attribute_set(&tx, id, &product_type.attribute_ids)?;

        tx.commit()?;
        Ok(())
    }

    fn get_product_type(
        &self,
        id: ProductTypeId,
        include_deleted: bool,
    ) -> RepoResult<Option<ProductType>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PRODUCT_TYPE_SELECT_SQL}
             WHERE uuid = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_product_type_row(self.conn, row)?));
        }

        Ok(None)
    }

    fn list_product_types(&self, query: &ProductTypeListQuery) -> RepoResult<Vec<ProductType>> {
        let mut sql = ListSql::new(PRODUCT_TYPE_SELECT_SQL);
        sql.exclude_deleted("is_deleted", query.include_deleted);
        sql.search(query.search.as_deref(), &["name", "code"]);
        if let Some(attribute_uuid) = query.attribute_uuid {
            sql.clause(
                "EXISTS (
                    SELECT 1
                    FROM product_type_attributes pta
                    WHERE pta.product_type_uuid = product_types.uuid
                      AND pta.attribute_uuid = ?
                )",
                Value::Text(attribute_uuid.to_string()),
            );
        }
        let (sql, binds) = sql.finish(
            "name COLLATE NOCASE ASC, uuid ASC",
            query.limit,
            query.offset,
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut product_types = Vec::new();
        while let Some(row) = rows.next()? {
            product_types.push(parse_product_type_row(self.conn, row)?);
        }

        Ok(product_types)
    }

    fn set_product_type_attributes(
        &self,
        id: ProductTypeId,
        attribute_ids: &[AttributeId],
    ) -> RepoResult<()> {
        validate_unique_attributes(attribute_ids)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if row_state(&tx, TABLE, id)? != Some(false) {
            return Err(RepoError::NotFound {
                entity: EntityKind::ProductType,
                id,
            });
        }
        apply_attribute_set(&tx, id, attribute_ids)?;
        tx.execute(
            "UPDATE product_types
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn soft_delete_product_type(&self, id: ProductTypeId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        match row_state(&tx, TABLE, id)? {
            None => {
                return Err(RepoError::NotFound {
                    entity: EntityKind::ProductType,
                    id,
                })
            }
            Some(true) => return Ok(()),
            Some(false) => {}
        }

        let product_count = count_products(&tx, id)?;
        if product_count > 0 {
            return Err(RepoError::InUse {
                entity: EntityKind::ProductType,
                id,
                product_count,
            });
        }
        tombstone(&tx, TABLE, id)?;

        tx.commit()?;
        Ok(())
    }

    fn restore_product_type(&self, id: ProductTypeId) -> RepoResult<()> {
        restore_row(self.conn, EntityKind::ProductType, TABLE, id)
    }

    fn count_product_type_products(&self, id: ProductTypeId) -> RepoResult<u32> {
        count_products(self.conn, id)
    }
}

fn count_products(conn: &Connection, id: ProductTypeId) -> RepoResult<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*)
         FROM products
         WHERE product_type_uuid = ?1
           AND is_deleted = 0;",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Replaces links of `id` with `attribute_ids`, guarding removed attributes
/// still in use by products of this type and newly linked required attributes
/// that existing products have no value for.
fn apply_attribute_set(
    conn: &Connection,
    id: ProductTypeId,
    attribute_ids: &[AttributeId],
) -> RepoResult<()> {
    for attribute_id in attribute_ids {
        if row_state(conn, "attributes", *attribute_id)? != Some(false) {
            return Err(RepoError::MissingReference {
                entity: EntityKind::Attribute,
                id: *attribute_id,
            });
        }
    }

    let current_ids = load_attribute_ids(conn, id)?;
    let active_products = count_products(conn, id)?;
    if active_products > 0 {
        for attribute_id in attribute_ids {
            if current_ids.contains(attribute_id) {
                continue;
            }
            let is_required: i64 = conn.query_row(
                "SELECT is_required FROM attributes WHERE uuid = ?1;",
                [attribute_id.to_string()],
                |row| row.get(0),
            )?;
            if parse_bool(is_required, "attributes.is_required")? {
                return Err(RepoError::InUse {
                    entity: EntityKind::Attribute,
                    id: *attribute_id,
                    product_count: active_products,
                });
            }
        }
    }

    let wanted: HashSet<AttributeId> = attribute_ids.iter().copied().collect();
    for current in current_ids {
        if wanted.contains(&current) {
            continue;
        }
        let product_count: u32 = conn.query_row(
            "SELECT COUNT(DISTINCT p.uuid)
             FROM products p
             INNER JOIN product_attribute_values v ON v.product_uuid = p.uuid
             WHERE p.product_type_uuid = ?1
               AND p.is_deleted = 0
               AND v.attribute_uuid = ?2;",
            params![id.to_string(), current.to_string()],
            |row| row.get(0),
        )?;
        if product_count > 0 {
            return Err(RepoError::InUse {
                entity: EntityKind::Attribute,
                id: current,
                product_count,
            });
        }
    }

    conn.execute(
        "DELETE FROM product_type_attributes WHERE product_type_uuid = ?1;",
        [id.to_string()],
    )?;
    for (position, attribute_id) in attribute_ids.iter().enumerate() {
        conn.execute(
            "INSERT INTO product_type_attributes (product_type_uuid, attribute_uuid, position)
             VALUES (?1, ?2, ?3);",
            params![id.to_string(), attribute_id.to_string(), position as i64],
        )?;
    }
    Ok(())
}

pub(crate) fn load_attribute_ids(
    conn: &Connection,
    id: ProductTypeId,
) -> RepoResult<Vec<AttributeId>> {
    let mut stmt = conn.prepare(
        "SELECT attribute_uuid
         FROM product_type_attributes
         WHERE product_type_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "product_type_attributes.attribute_uuid")?);
    }
    Ok(ids)
}

fn parse_product_type_row(conn: &Connection, row: &Row<'_>) -> RepoResult<ProductType> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "product_types.uuid")?;

    let product_type = ProductType {
        uuid,
        code: row.get("code")?,
        name: row.get("name")?,
        description: row.get("description")?,
        attribute_ids: load_attribute_ids(conn, uuid)?,
        is_deleted: parse_bool(row.get("is_deleted")?, "product_types.is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    product_type.validate()?;
    Ok(product_type)
}
