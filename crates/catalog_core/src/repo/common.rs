//! Shared repository error type and SQL helpers.
//!
//! # Invariants
//! - List limits default to 20 and clamp to 100.
//! - Search input is matched as a literal substring; `%`, `_` and `\` are
//!   escaped before reaching `LIKE`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::common::{EntityKind, ValidationError};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const LIST_DEFAULT_LIMIT: u32 = 20;
const LIST_LIMIT_MAX: u32 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Entity failed model validation before any write.
    Validation(ValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target row does not exist or is soft-deleted.
    NotFound { entity: EntityKind, id: Uuid },
    /// Restore target exists but is not deleted.
    NotDeleted { entity: EntityKind, id: Uuid },
    /// Another row already uses this code.
    Conflict { entity: EntityKind, code: String },
    /// Active products still reference the target.
    InUse {
        entity: EntityKind,
        id: Uuid,
        product_count: u32,
    },
    /// A referenced row is missing, deleted or inactive.
    MissingReference { entity: EntityKind, id: Uuid },
    /// Stored product value no longer fits its attribute.
    InvalidValue { attribute: Uuid, value: String },
    /// Required attribute has no stored product value.
    MissingRequiredValue { attribute: Uuid },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted into a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
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
                "{entity} {id} is still referenced by {product_count} active product(s)"
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
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "catalog repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "catalog repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Normalizes list limit: `None`/`0` -> 20, values above 100 -> 100.
pub fn normalize_list_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => LIST_DEFAULT_LIMIT,
        Some(value) if value > LIST_LIMIT_MAX => LIST_LIMIT_MAX,
        Some(value) => value,
    }
}

/// Normalizes search input; blank input disables search.
pub fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Incrementally built `SELECT ... WHERE` statement for list queries.
pub(crate) struct ListSql {
    sql: String,
    binds: Vec<Value>,
}

impl ListSql {
    /// `select` must end with the `FROM` clause.
    pub(crate) fn new(select: &str) -> Self {
        Self {
            sql: format!("{select} WHERE 1 = 1"),
            binds: Vec::new(),
        }
    }

    pub(crate) fn exclude_deleted(&mut self, column: &str, include_deleted: bool) {
        if !include_deleted {
            self.sql.push_str(&format!(" AND {column} = 0"));
        }
    }

    pub(crate) fn search(&mut self, search: Option<&str>, columns: &[&str]) {
        let Some(term) = normalize_search(search) else {
            return;
        };
        let pattern = format!("%{}%", escape_like(&term));
        let clauses = columns
            .iter()
            .map(|column| format!("{column} LIKE ? ESCAPE '\\'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.sql.push_str(&format!(" AND ({clauses})"));
        for _ in columns {
            self.binds.push(Value::Text(pattern.clone()));
        }
    }

    pub(crate) fn eq(&mut self, column: &str, value: Value) {
        self.sql.push_str(&format!(" AND {column} = ?"));
        self.binds.push(value);
    }

    /// Appends a raw predicate with exactly one `?` placeholder.
    pub(crate) fn clause(&mut self, predicate: &str, value: Value) {
        self.sql.push_str(&format!(" AND {predicate}"));
        self.binds.push(value);
    }

    pub(crate) fn finish(
        mut self,
        order_by: &str,
        limit: Option<u32>,
        offset: u32,
    ) -> (String, Vec<Value>) {
        self.sql.push_str(&format!(" ORDER BY {order_by}"));
        self.sql.push_str(" LIMIT ?");
        self.binds
            .push(Value::Integer(i64::from(normalize_list_limit(limit))));
        if offset > 0 {
            self.sql.push_str(" OFFSET ?");
            self.binds.push(Value::Integer(i64::from(offset)));
        }
        (self.sql, self.binds)
    }
}

pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Returns `None` for a missing row, `Some(is_deleted)` otherwise.
pub(crate) fn row_state(conn: &Connection, table: &str, id: Uuid) -> RepoResult<Option<bool>> {
    let state: Option<i64> = conn
        .query_row(
            &format!("SELECT is_deleted FROM {table} WHERE uuid = ?1;"),
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    state.map(|value| parse_bool(value, table)).transpose()
}

/// Returns whether `code` is used by any row other than `exclude`.
pub(crate) fn code_taken(
    conn: &Connection,
    table: &str,
    column: &str,
    code: &str,
    exclude: Uuid,
) -> RepoResult<bool> {
    let taken: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(
                SELECT 1 FROM {table} WHERE {column} = ?1 AND uuid <> ?2
            );"
        ),
        [code, exclude.to_string().as_str()],
        |row| row.get(0),
    )?;
    Ok(taken == 1)
}

/// Tombstones an active row. Already-deleted rows are left untouched.
pub(crate) fn tombstone(conn: &Connection, table: &str, id: Uuid) -> RepoResult<()> {
    conn.execute(
        &format!(
            "UPDATE {table}
             SET is_deleted = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;"
        ),
        [id.to_string()],
    )?;
    Ok(())
}

/// Clears the tombstone of a deleted row.
pub(crate) fn restore_row(
    conn: &Connection,
    entity: EntityKind,
    table: &str,
    id: Uuid,
) -> RepoResult<()> {
    match row_state(conn, table, id)? {
        None => Err(RepoError::NotFound { entity, id }),
        Some(false) => Err(RepoError::NotDeleted { entity, id }),
        Some(true) => {
            conn.execute(
                &format!(
                    "UPDATE {table}
                     SET is_deleted = 0,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE uuid = ?1;"
                ),
                [id.to_string()],
            )?;
            Ok(())
        }
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Verifies schema version and the presence of required tables/columns.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[(&'static str, &[&'static str])],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
