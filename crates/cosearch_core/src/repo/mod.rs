//! Repository layer: catalog persistence contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Isolate SQLite query details from service orchestration.
//! - Own association-table reconciliation (`links`).
//!
//! # Invariants
//! - Repositories never commit; the caller owns the transaction.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Association traversal is always an explicit query returning owned rows.

use crate::db::DbError;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod contribution_repo;
pub mod contributor_repo;
pub mod links;
pub mod review_repo;
pub mod tag_repo;

/// SQL expression producing the current time in epoch milliseconds.
pub(crate) const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

const DEFAULT_PAGE_LIMIT: u32 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every catalog repository.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Referenced entity does not resolve. Carries a human label such as
    /// `Tag ID 4`.
    NotFound(String),
    /// Persisted row cannot be converted into a domain record.
    InvalidData(String),
}

impl RepoError {
    pub fn not_found(label: &str, id: impl Display) -> Self {
        Self::NotFound(format!("{label} ID {id}"))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(what) => write!(f, "{what} cannot be found."),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
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

/// Naive offset pagination for list reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    pub fn new(skip: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            skip: skip.unwrap_or(0),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        }
    }

    pub(crate) fn bind_values(&self) -> [Value; 2] {
        [
            Value::Integer(i64::from(self.limit)),
            Value::Integer(i64::from(self.skip)),
        ]
    }
}

pub(crate) fn to_json_text<T: serde::Serialize>(column: &str, value: &T) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode {column}: {err}")))
}

pub(crate) fn from_json_text<T: serde::de::DeserializeOwned>(
    column: &str,
    value: &str,
) -> RepoResult<T> {
    serde_json::from_str(value)
        .map_err(|err| RepoError::InvalidData(format!("invalid JSON in {column}: {err}")))
}
