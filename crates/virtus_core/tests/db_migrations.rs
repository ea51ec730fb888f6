use rusqlite::Connection;
use std::fs;
use std::path::Path;
use virtus_core::db::migrations::{
    apply_migrations, bundled_migrations, current_version, discover_migrations, is_applied,
    install_bundled_migrations, latest_bundled_version, migrate,
};
use virtus_core::db::{open_db_in_memory, DbError};

fn write_unit(dir: &Path, name: &str, sql: &str) {
    fs::write(dir.join(name), sql).unwrap();
}

fn ledger_versions(conn: &Connection) -> Vec<u32> {
    let mut stmt = conn
        .prepare("SELECT version FROM schema_migrations ORDER BY version;")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn table_exists(conn: &Connection, table_name: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    exists == 1
}

#[test]
fn open_db_in_memory_applies_all_bundled_units() {
    let store = open_db_in_memory().unwrap();

    assert_eq!(store.schema_version().unwrap(), latest_bundled_version());
    for table in ["clients", "exercises", "sessions", "session_exercises", "invoices"] {
        assert!(table_exists(store.conn(), table), "table {table} missing");
    }
}

#[test]
fn migrating_twice_is_a_noop_and_ledger_max_matches_latest_unit() {
    let mut conn = Connection::open_in_memory().unwrap();
    let units = bundled_migrations();

    let first = apply_migrations(&mut conn, &units).unwrap();
    assert_eq!(first.from_version, 0);
    assert_eq!(first.applied, vec![1, 2, 3, 4]);

    let second = apply_migrations(&mut conn, &units).unwrap();
    assert!(second.is_noop());
    assert_eq!(current_version(&conn).unwrap(), latest_bundled_version());
    assert_eq!(ledger_versions(&conn), vec![1, 2, 3, 4]);
}

#[test]
fn malformed_unit_is_rolled_back_and_stops_later_units() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "0001_create_alpha.sql", "CREATE TABLE alpha (id INTEGER);");
    write_unit(
        dir.path(),
        "0002_broken.sql",
        "CREATE TABLE beta (id INTEGER); CREATE TABLE oops (;",
    );
    write_unit(dir.path(), "0003_create_gamma.sql", "CREATE TABLE gamma (id INTEGER);");

    let mut conn = Connection::open_in_memory().unwrap();
    let err = migrate(&mut conn, dir.path()).unwrap_err();

    assert!(matches!(err, DbError::MigrationFailed { version: 2, .. }));
    assert_eq!(ledger_versions(&conn), vec![1]);
    assert!(!is_applied(&conn, 2).unwrap());
    assert!(table_exists(&conn, "alpha"));
    assert!(!table_exists(&conn, "beta"));
    assert!(!table_exists(&conn, "gamma"));
}

#[test]
fn fixed_unit_resumes_after_last_applied_version() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "0001_create_alpha.sql", "CREATE TABLE alpha (id INTEGER);");
    write_unit(dir.path(), "0002_create_beta.sql", "CREATE TABLE beta (;");

    let mut conn = Connection::open_in_memory().unwrap();
    assert!(migrate(&mut conn, dir.path()).is_err());

    write_unit(dir.path(), "0002_create_beta.sql", "CREATE TABLE beta (id INTEGER);");
    let report = migrate(&mut conn, dir.path()).unwrap();

    assert_eq!(report.from_version, 1);
    assert_eq!(report.applied, vec![2]);
    assert!(table_exists(&conn, "beta"));
}

#[test]
fn version_gaps_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "0001_create_alpha.sql", "CREATE TABLE alpha (id INTEGER);");
    write_unit(dir.path(), "0005_create_epsilon.sql", "CREATE TABLE epsilon (id INTEGER);");

    let mut conn = Connection::open_in_memory().unwrap();
    let report = migrate(&mut conn, dir.path()).unwrap();

    assert_eq!(report.applied, vec![1, 5]);
    assert_eq!(current_version(&conn).unwrap(), 5);
}

#[test]
fn duplicate_versions_are_rejected_before_anything_runs() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "0001_create_alpha.sql", "CREATE TABLE alpha (id INTEGER);");
    write_unit(dir.path(), "0001_create_again.sql", "CREATE TABLE again (id INTEGER);");

    let err = discover_migrations(dir.path()).unwrap_err();
    match err {
        DbError::DuplicateMigrationVersion {
            version,
            first,
            second,
        } => {
            assert_eq!(version, 1);
            assert_eq!(first, "0001_create_again.sql");
            assert_eq!(second, "0001_create_alpha.sql");
        }
        other => panic!("unexpected error: {other}"),
    }

    let mut conn = Connection::open_in_memory().unwrap();
    assert!(migrate(&mut conn, dir.path()).is_err());
    assert!(!table_exists(&conn, "alpha"));
}

#[test]
fn sql_file_without_version_prefix_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "create_alpha.sql", "CREATE TABLE alpha (id INTEGER);");

    let err = discover_migrations(dir.path()).unwrap_err();
    assert!(matches!(err, DbError::InvalidMigrationName { file } if file == "create_alpha.sql"));
}

#[test]
fn non_sql_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "README.md", "notes about the schema");
    write_unit(dir.path(), "0001_create_alpha.sql", "CREATE TABLE alpha (id INTEGER);");

    let units = discover_migrations(dir.path()).unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].version, 1);
}

#[test]
fn ledger_ahead_of_a_pruned_directory_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    for unit in bundled_migrations().iter().filter(|unit| unit.version <= 2) {
        write_unit(dir.path(), &unit.name, &unit.sql);
    }
    let mut conn = Connection::open_in_memory().unwrap();
    apply_migrations(&mut conn, &bundled_migrations()).unwrap();

    let report = migrate(&mut conn, dir.path()).unwrap();

    assert!(report.is_noop());
    assert_eq!(report.from_version, latest_bundled_version());
    assert_eq!(current_version(&conn).unwrap(), latest_bundled_version());
}

#[test]
fn install_keeps_units_already_present_by_version() {
    let dir = tempfile::tempdir().unwrap();
    let custom = "CREATE TABLE exercises (id TEXT PRIMARY KEY);";
    write_unit(dir.path(), "0002_local_exercises.sql", custom);
    write_unit(dir.path(), "notes.txt", "not a unit");

    let written = install_bundled_migrations(dir.path()).unwrap();

    assert_eq!(written.len(), latest_bundled_version() as usize - 1);
    assert!(written
        .iter()
        .all(|path| !path.file_name().unwrap().to_string_lossy().starts_with("0002_")));
    assert_eq!(
        fs::read_to_string(dir.path().join("0002_local_exercises.sql")).unwrap(),
        custom
    );
    assert!(install_bundled_migrations(dir.path()).unwrap().is_empty());
}
