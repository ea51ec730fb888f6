//! Store bootstrap: probe, replace, open, configure and migrate.
//!
//! # Responsibility
//! - Prepare the `db/` directory tree and the single store connection.
//! - Replace an unrecoverable store file instead of crash-looping on it.
//! - Verify integrity again once migrations have run.
//!
//! # Invariants
//! - Returned handles have `foreign_keys=ON`; file handles use WAL journaling.
//! - Replacing a corrupt file is logged as `db_reset`, never as `db_create`.
//! - Only structural damage deletes a store file; other failures leave it in place.
//! - Integrity failure after migrations is fatal and never auto-recovered.
//!
//! # See also
//! - `db::migrations` for ledger semantics.

use super::migrations::{self, apply_migrations, bundled_migrations, MigrationReport};
use super::{DbError, DbResult};
use crate::config::StoreConfig;
use log::{error, info, warn};
use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";
const SIDECAR_SUFFIXES: [&str; 2] = ["-wal", "-shm"];

/// The single open connection to the embedded store.
///
/// Repositories borrow the connection through [`StoreHandle::conn`]; nothing
/// but dropping the handle closes it.
#[derive(Debug)]
pub struct StoreHandle {
    conn: Connection,
    path: Option<PathBuf>,
}

impl StoreHandle {
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// File path of the store, `None` for in-memory handles.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Applies pending units found in `dir`.
    pub fn migrate(&mut self, dir: &Path) -> DbResult<MigrationReport> {
        migrations::migrate(&mut self.conn, dir)
    }

    /// Returns `MAX(schema_migrations.version)`, `0` before the first migration.
    pub fn schema_version(&self) -> DbResult<u32> {
        migrations::current_version(&self.conn)
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

/// Result of inspecting an existing store file before opening it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Missing,
    Healthy,
    /// The file cannot serve as a store; carries the reason.
    Unrecoverable(String),
    /// The file could not be inspected; its contents are unknown.
    Unavailable(String),
}

impl ProbeOutcome {
    /// Inspects `path` without creating it.
    ///
    /// Only structural damage is unrecoverable: a short file, a missing
    /// SQLite header, a SQLite "not a database" or corruption error, or an
    /// integrity check that is not `ok`. Any other failure is `Unavailable`.
    pub fn probe(path: &Path) -> Self {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Self::Missing,
            Err(err) => return Self::Unavailable(format!("cannot read store file: {err}")),
        };

        let mut header = [0_u8; 16];
        match file.read_exact(&mut header) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                return Self::Unrecoverable(format!("store file too short: {err}"));
            }
            Err(err) => return Self::Unavailable(format!("cannot read store file: {err}")),
        }
        if &header != SQLITE_HEADER {
            return Self::Unrecoverable("missing sqlite header".to_string());
        }
        drop(file);

        let conn = match Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        ) {
            Ok(conn) => conn,
            Err(err) => return Self::from_sqlite_error("open failed", &err),
        };

        match integrity_status(&conn) {
            Ok(status) if status.eq_ignore_ascii_case("ok") => Self::Healthy,
            Ok(status) => Self::Unrecoverable(status),
            Err(err) => Self::from_sqlite_error("integrity check failed to run", &err),
        }
    }

    fn from_sqlite_error(context: &str, err: &rusqlite::Error) -> Self {
        let reason = format!("{context}: {err}");
        if is_structural(err) {
            Self::Unrecoverable(reason)
        } else {
            Self::Unavailable(reason)
        }
    }
}

fn is_structural(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
    )
}

/// Opens the file store described by `config`, replacing it when corrupt.
///
/// The returned handle is configured but not migrated; see [`bootstrap`].
///
/// # Errors
/// - `StoreUnavailable` when directories cannot be created, the existing
///   file cannot be inspected, a corrupt file cannot be removed, or SQLite
///   cannot open the path.
///
/// # Side effects
/// - Creates `db/` and `db/migrations/` when absent.
/// - May delete the existing store file (logged as `db_reset`).
pub fn open_store(config: &StoreConfig) -> DbResult<StoreHandle> {
    let started_at = Instant::now();
    let path = config.db_path();
    info!("event=db_open module=db status=start mode=file");

    ensure_dir(&config.db_dir())?;
    ensure_dir(&config.migrations_dir())?;

    match ProbeOutcome::probe(&path) {
        ProbeOutcome::Healthy => {}
        ProbeOutcome::Missing => {
            info!(
                "event=db_create module=db status=ok path={}",
                path.display()
            );
        }
        ProbeOutcome::Unrecoverable(reason) => {
            error!(
                "event=db_reset module=db status=error error_code=store_replaced path={} reason={}",
                path.display(),
                reason
            );
            remove_store_files(&path)?;
        }
        ProbeOutcome::Unavailable(reason) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=store_unavailable path={} reason={}",
                started_at.elapsed().as_millis(),
                path.display(),
                reason
            );
            return Err(DbError::StoreUnavailable { path, reason });
        }
    }

    let conn = Connection::open(&path).map_err(|err| {
        error!(
            "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        DbError::StoreUnavailable {
            path: path.clone(),
            reason: err.to_string(),
        }
    })?;

    configure_connection(&conn, true).map_err(|err| {
        error!(
            "event=db_open module=db status=error mode=file duration_ms={} error_code=db_configure_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        err
    })?;

    info!(
        "event=db_open module=db status=ok mode=file duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(StoreHandle {
        conn,
        path: Some(path),
    })
}

/// Opens, migrates and verifies the store: the full startup sequence.
///
/// # Errors
/// - Everything [`open_store`] returns.
/// - `UnsupportedSchemaVersion` when the ledger is newer than every known
///   unit; the store is left untouched.
/// - `MigrationFailed` and friends from the migration engine.
/// - `IntegrityCheckFailed` when the migrated store fails its check.
pub fn bootstrap(config: &StoreConfig) -> DbResult<StoreHandle> {
    let mut handle = open_store(config)?;
    let migrations_dir = config.migrations_dir();

    if config.install_bundled_migrations {
        migrations::install_bundled_migrations(&migrations_dir)?;
    }

    ensure_supported_version(handle.conn(), &migrations_dir)?;
    handle.migrate(&migrations_dir)?;
    verify_integrity(handle.conn())?;
    Ok(handle)
}

/// Rejects a store whose ledger is ahead of every unit this build knows.
///
/// Known units are the bundled ones plus whatever `dir` holds.
fn ensure_supported_version(conn: &Connection, dir: &Path) -> DbResult<()> {
    let db_version = migrations::current_version(conn)?;
    let latest_supported = migrations::discover_migrations(dir)?
        .last()
        .map_or(0, |migration| migration.version)
        .max(migrations::latest_bundled_version());
    if db_version <= latest_supported {
        return Ok(());
    }

    error!(
        "event=db_open module=db status=error mode=file error_code=unsupported_schema_version db_version={} latest_supported={}",
        db_version, latest_supported
    );
    Err(DbError::UnsupportedSchemaVersion {
        db_version,
        latest_supported,
    })
}

/// Opens an in-memory store with the bundled schema applied.
pub fn open_db_in_memory() -> DbResult<StoreHandle> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let mut conn = Connection::open_in_memory()?;
    configure_connection(&conn, false)?;
    match apply_migrations(&mut conn, &bundled_migrations()) {
        Ok(_) => {
            info!(
                "event=db_open module=db status=ok mode=memory duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(StoreHandle { conn, path: None })
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Runs `PRAGMA integrity_check` and fails unless it reports `ok`.
///
/// A check that cannot run because SQLite reports the file as corrupt is an
/// integrity failure as well.
pub fn verify_integrity(conn: &Connection) -> DbResult<()> {
    let status = match integrity_status(conn) {
        Ok(status) => status,
        Err(err) if is_structural(&err) => err.to_string(),
        Err(err) => return Err(err.into()),
    };
    if status.eq_ignore_ascii_case("ok") {
        info!("event=integrity_check module=db status=ok");
        return Ok(());
    }

    error!(
        "event=integrity_check module=db status=error error_code=integrity_check_failed details={}",
        status
    );
    Err(DbError::IntegrityCheckFailed { details: status })
}

fn integrity_status(conn: &Connection) -> Result<String, rusqlite::Error> {
    conn.query_row("PRAGMA integrity_check;", [], |row| row.get::<_, String>(0))
}

fn configure_connection(conn: &Connection, wal: bool) -> DbResult<()> {
    if wal {
        conn.pragma_update(None, "journal_mode", "WAL")?;
    }
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

fn ensure_dir(dir: &Path) -> DbResult<()> {
    fs::create_dir_all(dir).map_err(|err| {
        error!(
            "event=db_prepare module=db status=error error_code=store_unavailable path={} error={}",
            dir.display(),
            err
        );
        DbError::StoreUnavailable {
            path: dir.to_path_buf(),
            reason: err.to_string(),
        }
    })
}

fn remove_store_files(path: &Path) -> DbResult<()> {
    let mut targets = vec![path.to_path_buf()];
    for suffix in SIDECAR_SUFFIXES {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(suffix);
        targets.push(PathBuf::from(sidecar));
    }

    for target in targets {
        match fs::remove_file(&target) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(DbError::StoreUnavailable {
                    path: target,
                    reason: format!("cannot remove unrecoverable store file: {err}"),
                });
            }
        }
    }

    warn!(
        "event=db_reset module=db status=ok path={} detail=recreating_empty_store",
        path.display()
    );
    Ok(())
}
