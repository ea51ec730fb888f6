//! SQLite store bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open, probe and configure the single store connection for the process.
//! - Apply versioned schema migrations tracked in `schema_migrations`.
//!
//! # Invariants
//! - The applied schema version is `MAX(schema_migrations.version)`.
//! - Application data is never read or written before migrations succeed.
//! - A corrupt store found at open time is replaced; corruption found after
//!   migrations is fatal.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{
    bootstrap, open_db_in_memory, open_store, verify_integrity, ProbeOutcome, StoreHandle,
};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The store location cannot be created, cleaned up or opened.
    StoreUnavailable { path: PathBuf, reason: String },
    /// `PRAGMA integrity_check` failed after migrations ran.
    IntegrityCheckFailed { details: String },
    /// A migration unit's script failed; its transaction was rolled back.
    MigrationFailed {
        version: u32,
        cause: rusqlite::Error,
    },
    /// A `.sql` file in the migrations directory has no numeric prefix.
    InvalidMigrationName { file: String },
    /// Two migration units claim the same version.
    DuplicateMigrationVersion {
        version: u32,
        first: String,
        second: String,
    },
    MigrationSourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable { path, reason } => {
                write!(f, "store unavailable at `{}`: {reason}", path.display())
            }
            Self::IntegrityCheckFailed { details } => {
                write!(f, "store integrity check failed: {details}")
            }
            Self::MigrationFailed { version, cause } => {
                write!(f, "migration {version} failed: {cause}")
            }
            Self::InvalidMigrationName { file } => write!(
                f,
                "migration file `{file}` must start with a numeric version followed by `_`"
            ),
            Self::DuplicateMigrationVersion {
                version,
                first,
                second,
            } => write!(
                f,
                "migration version {version} is declared by both `{first}` and `{second}`"
            ),
            Self::MigrationSourceUnreadable { path, source } => {
                write!(f, "cannot read migration `{}`: {source}", path.display())
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MigrationFailed { cause, .. } => Some(cause),
            Self::MigrationSourceUnreadable { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
