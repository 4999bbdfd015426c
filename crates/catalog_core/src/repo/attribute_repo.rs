//! Attribute repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist attribute definitions and their select options.
//! - Enforce attribute-level delete and redefinition guards atomically.
//!
//! # Invariants
//! - Write paths call `Attribute::validate()` before SQL mutations.
//! - Soft delete fails while active products store a value for the attribute,
//!   and otherwise detaches the attribute from every product type.
//! - Changing `kind`, or dropping an option that products still use, fails
//!   while active products store values for the attribute.
//! - Marking an attribute required fails while active products of a linked
//!   type store no value for it.

use crate::model::attribute::{Attribute, AttributeId, AttributeKind};
use crate::model::common::EntityKind;
use crate::repo::common::{
    bool_to_int, code_taken, ensure_connection_ready, parse_bool, parse_uuid, restore_row,
    row_state, tombstone, ListSql, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const TABLE: &str = "attributes";

const ATTRIBUTE_COLUMNS: &[&str] = &[
    "uuid",
    "code",
    "name",
    "kind",
    "is_required",
    "is_filterable",
    "is_deleted",
    "created_at",
    "updated_at",
];
const OPTION_COLUMNS: &[&str] = &["attribute_uuid", "position", "value"];

const ATTRIBUTE_SELECT_SQL: &str = "SELECT
    uuid,
    code,
    name,
    kind,
    is_required,
    is_filterable,
    is_deleted,
    created_at,
    updated_at
FROM attributes";

/// Query options for listing attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeListQuery {
    /// Case-insensitive substring over name and code.
    pub search: Option<String>,
    pub kind: Option<AttributeKind>,
    pub is_filterable: Option<bool>,
    pub include_deleted: bool,
    /// Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for attribute operations.
pub trait AttributeRepository {
    fn create_attribute(&self, attribute: &Attribute) -> RepoResult<AttributeId>;
    /// Rewrites an active attribute, options included.
    fn update_attribute(&self, attribute: &Attribute) -> RepoResult<()>;
    fn get_attribute(&self, id: AttributeId, include_deleted: bool)
        -> RepoResult<Option<Attribute>>;
    fn list_attributes(&self, query: &AttributeListQuery) -> RepoResult<Vec<Attribute>>;
    /// Guarded soft delete; idempotent for already-deleted rows.
    fn soft_delete_attribute(&self, id: AttributeId) -> RepoResult<()>;
    fn restore_attribute(&self, id: AttributeId) -> RepoResult<()>;
    /// Counts active products that store a value for this attribute.
    fn count_attribute_products(&self, id: AttributeId) -> RepoResult<u32>;
}

/// SQLite-backed attribute repository.
pub struct SqliteAttributeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttributeRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (TABLE, ATTRIBUTE_COLUMNS),
                ("attribute_options", OPTION_COLUMNS),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl AttributeRepository for SqliteAttributeRepository<'_> {
    fn create_attribute(&self, attribute: &Attribute) -> RepoResult<AttributeId> {
        attribute.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if code_taken(&tx, TABLE, "code", &attribute.code, attribute.uuid)? {
            return Err(RepoError::Conflict {
                entity: EntityKind::Attribute,
                code: attribute.code.clone(),
            });
        }

        tx.execute(
            "INSERT INTO attributes (
                uuid,
                code,
                name,
                kind,
                is_required,
                is_filterable,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                attribute.uuid.to_string(),
                attribute.code.as_str(),
                attribute.name.as_str(),
                attribute.kind.as_str(),
                bool_to_int(attribute.is_required),
                bool_to_int(attribute.is_filterable),
                bool_to_int(attribute.is_deleted),
            ],
        )?;
        replace_options(&tx, attribute.uuid, &attribute.options)?;

        tx.commit()?;
        Ok(attribute.uuid)
    }

    fn update_attribute(&self, attribute: &Attribute) -> RepoResult<()> {
        attribute.validate()?;
        let id = attribute.uuid;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if row_state(&tx, TABLE, id)? != Some(false) {
            return Err(RepoError::NotFound {
                entity: EntityKind::Attribute,
                id,
            });
        }
        if code_taken(&tx, TABLE, "code", &attribute.code, id)? {
            return Err(RepoError::Conflict {
                entity: EntityKind::Attribute,
                code: attribute.code.clone(),
            });
        }

        let current_kind: String =
            tx.query_row("SELECT kind FROM attributes WHERE uuid = ?1;", [id.to_string()], |row| {
                row.get(0)
            })?;
        if current_kind != attribute.kind.as_str() {
            let product_count = count_products_with_values(&tx, id)?;
            if product_count > 0 {
                return Err(RepoError::InUse {
                    entity: EntityKind::Attribute,
                    id,
                    product_count,
                });
            }
        }

        if attribute.is_required {
            let product_count = count_products_missing_value(&tx, id)?;
            if product_count > 0 {
                return Err(RepoError::InUse {
                    entity: EntityKind::Attribute,
                    id,
                    product_count,
                });
            }
        }

        tx.execute(
            "UPDATE attributes
             SET
                code = ?2,
                name = ?3,
                kind = ?4,
                is_required = ?5,
                is_filterable = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                attribute.code.as_str(),
                attribute.name.as_str(),
                attribute.kind.as_str(),
                bool_to_int(attribute.is_required),
                bool_to_int(attribute.is_filterable),
            ],
        )?;
        replace_options(&tx, id, &attribute.options)?;

        if attribute.kind == AttributeKind::Select {
            let product_count = count_products_outside_options(&tx, id)?;
            if product_count > 0 {
                return Err(RepoError::InUse {
                    entity: EntityKind::Attribute,
                    id,
                    product_count,
                });
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn get_attribute(
        &self,
        id: AttributeId,
        include_deleted: bool,
    ) -> RepoResult<Option<Attribute>> {
        load_attribute(self.conn, id, include_deleted)
    }

    fn list_attributes(&self, query: &AttributeListQuery) -> RepoResult<Vec<Attribute>> {
        let mut sql = ListSql::new(ATTRIBUTE_SELECT_SQL);
        sql.exclude_deleted("is_deleted", query.include_deleted);
        sql.search(query.search.as_deref(), &["name", "code"]);
        if let Some(kind) = query.kind {
            sql.eq("kind", Value::Text(kind.as_str().to_string()));
        }
        if let Some(is_filterable) = query.is_filterable {
            sql.eq("is_filterable", Value::Integer(bool_to_int(is_filterable)));
        }
        let (sql, binds) = sql.finish(
            "name COLLATE NOCASE ASC, uuid ASC",
            query.limit,
            query.offset,
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut attributes = Vec::new();
        while let Some(row) = rows.next()? {
            attributes.push(parse_attribute_row(self.conn, row)?);
        }

        Ok(attributes)
    }

    fn soft_delete_attribute(&self, id: AttributeId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        match row_state(&tx, TABLE, id)? {
            None => {
                return Err(RepoError::NotFound {
                    entity: EntityKind::Attribute,
                    id,
                })
            }
            Some(true) => return Ok(()),
            Some(false) => {}
        }

        let product_count = count_products_with_values(&tx, id)?;
        if product_count > 0 {
            return Err(RepoError::InUse {
                entity: EntityKind::Attribute,
                id,
                product_count,
            });
        }

        tx.execute(
            "UPDATE product_types
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid IN (
                SELECT product_type_uuid
                FROM product_type_attributes
                WHERE attribute_uuid = ?1
             );",
            [id.to_string()],
        )?;
        tx.execute(
            "DELETE FROM product_type_attributes WHERE attribute_uuid = ?1;",
            [id.to_string()],
        )?;
        tombstone(&tx, TABLE, id)?;

        tx.commit()?;
        Ok(())
    }

    fn restore_attribute(&self, id: AttributeId) -> RepoResult<()> {
        restore_row(self.conn, EntityKind::Attribute, TABLE, id)
    }

    fn count_attribute_products(&self, id: AttributeId) -> RepoResult<u32> {
        count_products_with_values(self.conn, id)
    }
}

fn count_products_with_values(conn: &Connection, id: AttributeId) -> RepoResult<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(DISTINCT p.uuid)
         FROM product_attribute_values v
         INNER JOIN products p ON p.uuid = v.product_uuid
         WHERE v.attribute_uuid = ?1
           AND p.is_deleted = 0;",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Active products whose type links `id` but that store no value for it.
fn count_products_missing_value(conn: &Connection, id: AttributeId) -> RepoResult<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(DISTINCT p.uuid)
         FROM products p
         INNER JOIN product_type_attributes l ON l.product_type_uuid = p.product_type_uuid
         WHERE l.attribute_uuid = ?1
           AND p.is_deleted = 0
           AND NOT EXISTS (
                SELECT 1
                FROM product_attribute_values v
                WHERE v.product_uuid = p.uuid
                  AND v.attribute_uuid = ?1
           );",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn count_products_outside_options(conn: &Connection, id: AttributeId) -> RepoResult<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(DISTINCT p.uuid)
         FROM product_attribute_values v
         INNER JOIN products p ON p.uuid = v.product_uuid
         WHERE v.attribute_uuid = ?1
           AND p.is_deleted = 0
           AND v.value NOT IN (
                SELECT value FROM attribute_options WHERE attribute_uuid = ?1
           );",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn replace_options(conn: &Connection, id: AttributeId, options: &[String]) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM attribute_options WHERE attribute_uuid = ?1;",
        [id.to_string()],
    )?;
    for (position, option) in options.iter().enumerate() {
        conn.execute(
            "INSERT INTO attribute_options (attribute_uuid, position, value)
             VALUES (?1, ?2, ?3);",
            params![id.to_string(), position as i64, option.as_str()],
        )?;
    }
    Ok(())
}

pub(crate) fn load_attribute(
    conn: &Connection,
    id: AttributeId,
    include_deleted: bool,
) -> RepoResult<Option<Attribute>> {
    let mut stmt = conn.prepare(&format!(
        "{ATTRIBUTE_SELECT_SQL}
         WHERE uuid = ?1
           AND (?2 = 1 OR is_deleted = 0);"
    ))?;

    let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_attribute_row(conn, row)?));
    }

    Ok(None)
}

pub(crate) fn load_options(conn: &Connection, id: AttributeId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT value
         FROM attribute_options
         WHERE attribute_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut options = Vec::new();
    while let Some(row) = rows.next()? {
        options.push(row.get(0)?);
    }
    Ok(options)
}

fn parse_attribute_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Attribute> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "attributes.uuid")?;

    let kind_text: String = row.get("kind")?;
    let kind = AttributeKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid attribute kind `{kind_text}` in attributes.kind"))
    })?;

    let attribute = Attribute {
        uuid,
        code: row.get("code")?,
        name: row.get("name")?,
        kind,
        options: load_options(conn, uuid)?,
        is_required: parse_bool(row.get("is_required")?, "attributes.is_required")?,
        is_filterable: parse_bool(row.get("is_filterable")?, "attributes.is_filterable")?,
        is_deleted: parse_bool(row.get("is_deleted")?, "attributes.is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    attribute.validate()?;
    Ok(attribute)
}
