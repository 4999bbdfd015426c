//! Catalog store: one SQLite file holding attributes, companies, product
//! types and products.
//!
//! Every connection handed out here has foreign keys enforced and the
//! catalog schema (`0001_catalog`, `0002_products`) applied. Repositories
//! refuse connections whose `user_version` is behind the latest migration.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};
pub use rusqlite::Connection;

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the catalog store.
#[derive(Debug)]
pub enum DbError {
    /// SQLite rejected a pragma, migration or catalog statement.
    Sqlite(rusqlite::Error),
    /// Directory for the catalog file could not be created.
    Io(std::io::Error),
    /// The file was written by a newer catalog build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "cannot prepare catalog database path: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "catalog schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
