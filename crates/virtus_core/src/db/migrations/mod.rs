//! Migration discovery, ledger tracking and executor.
//!
//! # Responsibility
//! - Discover `NNNN_slug.sql` units in a migrations directory.
//! - Apply pending units one transaction at a time, recording each in the
//!   `schema_migrations` ledger.
//! - Ship the application schema as bundled units that can be installed into
//!   an empty migrations directory.
//!
//! # Invariants
//! - Units apply in strictly ascending version order, at most once per file.
//! - A failed unit rolls back completely, gets no ledger row and stops the run.
//! - Duplicate versions are rejected, never deduplicated.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

const LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);";

const MIGRATION_EXTENSION: &str = "sql";

/// One versioned schema-change script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub version: u32,
    /// File name the unit was loaded from, e.g. `0002_create_exercises_table.sql`.
    pub name: String,
    pub sql: String,
}

/// Outcome of one migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    /// Versions applied by this run, ascending.
    pub applied: Vec<u32>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct BundledMigration {
    version: u32,
    file_name: &'static str,
    sql: &'static str,
}

const BUNDLED: &[BundledMigration] = &[
    BundledMigration {
        version: 1,
        file_name: "0001_create_clients_table.sql",
        sql: include_str!("0001_create_clients_table.sql"),
    },
    BundledMigration {
        version: 2,
        file_name: "0002_create_exercises_table.sql",
        sql: include_str!("0002_create_exercises_table.sql"),
    },
    BundledMigration {
        version: 3,
        file_name: "0003_create_sessions_tables.sql",
        sql: include_str!("0003_create_sessions_tables.sql"),
    },
    BundledMigration {
        version: 4,
        file_name: "0004_create_invoices_table.sql",
        sql: include_str!("0004_create_invoices_table.sql"),
    },
];

/// Returns the latest schema version shipped with this binary.
pub fn latest_bundled_version() -> u32 {
    BUNDLED.last().map_or(0, |migration| migration.version)
}

/// Returns the schema units shipped with this binary, ascending.
pub fn bundled_migrations() -> Vec<Migration> {
    BUNDLED
        .iter()
        .map(|bundled| Migration {
            version: bundled.version,
            name: bundled.file_name.to_string(),
            sql: bundled.sql.to_string(),
        })
        .collect()
}

/// Writes every bundled unit whose version is not yet present in `dir`.
///
/// Existing files are never overwritten. Returns the paths written.
pub fn install_bundled_migrations(dir: &Path) -> DbResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|err| DbError::StoreUnavailable {
        path: dir.to_path_buf(),
        reason: err.to_string(),
    })?;

    let present = present_versions(dir)?;
    let mut written = Vec::new();
    for bundled in BUNDLED {
        if present.contains(&bundled.version) {
            continue;
        }
        let path = dir.join(bundled.file_name);
        fs::write(&path, bundled.sql).map_err(|err| DbError::StoreUnavailable {
            path: path.clone(),
            reason: err.to_string(),
        })?;
        info!(
            "event=migration_install module=db status=ok version={} file={}",
            bundled.version, bundled.file_name
        );
        written.push(path);
    }
    Ok(written)
}

/// Extracts the version prefix from a unit file name.
///
/// `0002_create_exercises_table.sql` yields `Some(2)`. Names without an
/// all-digit prefix before the first `_`, or with version `0`, yield `None`.
pub fn parse_migration_version(file_name: &str) -> Option<u32> {
    let (prefix, _) = file_name.split_once('_')?;
    if prefix.is_empty() || !prefix.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    prefix.parse::<u32>().ok().filter(|version| *version > 0)
}

/// Loads all `.sql` units from `dir`, sorted by version.
///
/// # Errors
/// - `InvalidMigrationName` when a `.sql` file has no version prefix.
/// - `DuplicateMigrationVersion` when two files share a version.
/// - `MigrationSourceUnreadable` when the directory or a file cannot be read.
pub fn discover_migrations(dir: &Path) -> DbResult<Vec<Migration>> {
    let entries = fs::read_dir(dir).map_err(|source| DbError::MigrationSourceUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut migrations = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DbError::MigrationSourceUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() || !has_migration_extension(&path) {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let version = parse_migration_version(&name)
            .ok_or_else(|| DbError::InvalidMigrationName { file: name.clone() })?;
        let sql = fs::read_to_string(&path)
            .map_err(|source| DbError::MigrationSourceUnreadable { path, source })?;

        migrations.push(Migration { version, name, sql });
    }

    migrations.sort_by(|left, right| {
        left.version
            .cmp(&right.version)
            .then_with(|| left.name.cmp(&right.name))
    });
    reject_duplicate_versions(&migrations)?;
    Ok(migrations)
}

/// Returns the applied schema version, or `0` when the ledger is absent or empty.
pub fn current_version(conn: &Connection) -> DbResult<u32> {
    let ledger_exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'schema_migrations'
        );",
        [],
        |row| row.get(0),
    )?;
    if ledger_exists == 0 {
        return Ok(0);
    }

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations;",
        [],
        |row| row.get::<_, u32>(0),
    )?;
    Ok(version)
}

/// Returns whether the ledger records `version` as applied.
pub fn is_applied(conn: &Connection, version: u32) -> DbResult<bool> {
    if current_version(conn)? == 0 {
        return Ok(false);
    }
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?1);",
        params![version],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Discovers units in `dir` and applies the pending ones.
///
/// # Side effects
/// - Creates the `schema_migrations` ledger when missing.
/// - Emits `migrate` and `migration_apply` logging events.
pub fn migrate(conn: &mut Connection, dir: &Path) -> DbResult<MigrationReport> {
    let started_at = Instant::now();
    info!(
        "event=migrate module=db status=start dir={}",
        dir.display()
    );

    let result = discover_migrations(dir).and_then(|units| apply_migrations(conn, &units));
    match &result {
        Ok(report) => info!(
            "event=migrate module=db status=ok duration_ms={} from_version={} to_version={} applied={}",
            started_at.elapsed().as_millis(),
            report.from_version,
            report.to_version,
            report.applied.len()
        ),
        Err(err) => error!(
            "event=migrate module=db status=error duration_ms={} error_code=migrate_failed error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

/// Applies every unit in `migrations` newer than the ledger's version.
///
/// Units may be passed in any order; they are applied ascending. Each unit
/// runs in its own transaction together with its ledger insert. Units at or
/// below the ledger's version are skipped, so a ledger ahead of `migrations`
/// is a no-op.
pub fn apply_migrations(
    conn: &mut Connection,
    migrations: &[Migration],
) -> DbResult<MigrationReport> {
    let mut ordered: Vec<&Migration> = migrations.iter().collect();
    ordered.sort_by(|left, right| {
        left.version
            .cmp(&right.version)
            .then_with(|| left.name.cmp(&right.name))
    });
    for pair in ordered.windows(2) {
        if pair[0].version == pair[1].version {
            return Err(duplicate_error(pair[0], pair[1]));
        }
    }

    conn.execute_batch(LEDGER_DDL)?;
    let from_version = current_version(conn)?;

    let mut report = MigrationReport {
        from_version,
        to_version: from_version,
        applied: Vec::new(),
    };

    for migration in ordered {
        if migration.version <= report.to_version {
            continue;
        }

        if let Err(cause) = apply_one(conn, migration) {
            error!(
                "event=migration_apply module=db status=error version={} file={} error_code=migration_failed error={}",
                migration.version, migration.name, cause
            );
            return Err(DbError::MigrationFailed {
                version: migration.version,
                cause,
            });
        }

        info!(
            "event=migration_apply module=db status=ok version={} file={}",
            migration.version, migration.name
        );
        report.to_version = migration.version;
        report.applied.push(migration.version);
    }

    Ok(report)
}

fn apply_one(conn: &mut Connection, migration: &Migration) -> Result<(), rusqlite::Error> {
    // Dropping `tx` on any early return rolls the unit back.
    let tx = conn.transaction()?;
    tx.execute_batch(&migration.sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (version) VALUES (?1);",
        params![migration.version],
    )?;
    tx.commit()
}

fn reject_duplicate_versions(migrations: &[Migration]) -> DbResult<()> {
    for pair in migrations.windows(2) {
        if pair[0].version == pair[1].version {
            return Err(duplicate_error(&pair[0], &pair[1]));
        }
    }
    Ok(())
}

fn duplicate_error(first: &Migration, second: &Migration) -> DbError {
    DbError::DuplicateMigrationVersion {
        version: first.version,
        first: first.name.clone(),
        second: second.name.clone(),
    }
}

fn has_migration_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MIGRATION_EXTENSION))
}

fn present_versions(dir: &Path) -> DbResult<Vec<u32>> {
    let entries = fs::read_dir(dir).map_err(|source| DbError::MigrationSourceUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut versions = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DbError::MigrationSourceUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !has_migration_extension(&path) {
            continue;
        }
        if let Some(version) = parse_migration_version(&entry.file_name().to_string_lossy()) {
            versions.push(version);
        }
    }
    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::{bundled_migrations, latest_bundled_version, parse_migration_version};

    #[test]
    fn parse_version_reads_zero_padded_prefix() {
        assert_eq!(parse_migration_version("0002_create_exercises_table.sql"), Some(2));
        assert_eq!(parse_migration_version("12_add_index.sql"), Some(12));
    }

    #[test]
    fn parse_version_rejects_missing_or_non_numeric_prefix() {
        assert_eq!(parse_migration_version("create_exercises.sql"), None);
        assert_eq!(parse_migration_version("v2_create.sql"), None);
        assert_eq!(parse_migration_version("_create.sql"), None);
        assert_eq!(parse_migration_version("0002.sql"), None);
        assert_eq!(parse_migration_version("0000_zero.sql"), None);
    }

    #[test]
    fn bundled_versions_match_file_prefixes_and_ascend() {
        let bundled = bundled_migrations();
        for migration in &bundled {
            assert_eq!(parse_migration_version(&migration.name), Some(migration.version));
        }
        assert!(bundled
            .windows(2)
            .all(|pair| pair[0].version < pair[1].version));
        assert_eq!(latest_bundled_version(), 4);
    }
}
