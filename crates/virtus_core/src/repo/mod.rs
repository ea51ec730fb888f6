//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Keep SQL and code/label translation inside the persistence boundary.
//! - Translate raw SQLite failures into semantic errors (`NotFound`,
//!   `DuplicateKey`, `ConflictingReference`).
//!
//! # Invariants
//! - Writes persist canonical labels; reads return codes.
//! - Repositories borrow the store connection and never close it.

use crate::db::DbError;
use chrono::NaiveDate;
use rusqlite::ffi;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub mod client_repo;
pub mod exercise_repo;
pub mod invoice_repo;
pub mod session_repo;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every entity repository.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: String,
    },
    /// A uniqueness rule rejected the write.
    DuplicateKey {
        entity: &'static str,
        detail: String,
    },
    /// Deletion refused because dependent rows still reference the record.
    ConflictingReference {
        entity: &'static str,
        id: String,
        referenced_by: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::DuplicateKey { entity, detail } => {
                write!(f, "duplicate {entity}: {detail}")
            }
            Self::ConflictingReference {
                entity,
                id,
                referenced_by,
            } => write!(f, "{entity} {id} is still referenced by {referenced_by}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
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

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Maps unique/primary-key violations on insert or update to `DuplicateKey`.
pub(crate) fn map_write_error(err: rusqlite::Error, entity: &'static str) -> RepoError {
    match constraint_code(&err) {
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) | Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
            RepoError::DuplicateKey {
                entity,
                detail: err.to_string(),
            }
        }
        _ => RepoError::from(err),
    }
}

/// Maps a foreign-key violation raised by a hard delete to `ConflictingReference`.
pub(crate) fn map_delete_error(
    err: rusqlite::Error,
    entity: &'static str,
    id: &Uuid,
) -> RepoError {
    match constraint_code(&err) {
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => RepoError::ConflictingReference {
            entity,
            id: id.to_string(),
            referenced_by: "dependent rows",
        },
        _ => RepoError::from(err),
    }
}

fn constraint_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Some(inner.extended_code)
        }
        _ => None,
    }
}

/// Process time in Unix epoch seconds.
pub(crate) fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(value: Option<String>, column: &str) -> RepoResult<Option<Uuid>> {
    value.as_deref().map(|text| parse_uuid(text, column)).transpose()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date value `{value}` in {column}")))
}

pub(crate) fn parse_optional_date(
    value: Option<String>,
    column: &str,
) -> RepoResult<Option<NaiveDate>> {
    value.as_deref().map(|text| parse_date(text, column)).transpose()
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
