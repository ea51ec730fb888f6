//! Store location and bootstrap settings.
//!
//! # Responsibility
//! - Resolve the on-disk layout (`db/app.db`, `db/migrations/`) under one root.
//! - Carry bootstrap toggles from callers into `db::bootstrap`.
//!
//! # Invariants
//! - The store file and the migrations directory are always siblings under
//!   `<root>/db`.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data root directory.
pub const DATA_DIR_ENV: &str = "VIRTUS_DATA_DIR";

const DB_DIR_NAME: &str = "db";
const DB_FILE_NAME: &str = "app.db";
const MIGRATIONS_DIR_NAME: &str = "migrations";

/// Settings used to locate and prepare the embedded store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory containing the `db/` tree.
    pub root_dir: PathBuf,
    /// Write bundled migration units into the migrations directory when they
    /// are missing there.
    pub install_bundled_migrations: bool,
}

impl StoreConfig {
    /// Creates a config rooted at `root_dir` with bundled migrations enabled.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            install_bundled_migrations: true,
        }
    }

    /// Reads the root from `VIRTUS_DATA_DIR`, defaulting to the working
    /// directory.
    pub fn from_env() -> Self {
        match std::env::var_os(DATA_DIR_ENV) {
            Some(value) if !value.is_empty() => Self::new(PathBuf::from(value)),
            _ => Self::new("."),
        }
    }

    /// Directory holding the store file and the migrations directory.
    pub fn db_dir(&self) -> PathBuf {
        self.root_dir.join(DB_DIR_NAME)
    }

    /// Full path of the SQLite store file.
    pub fn db_path(&self) -> PathBuf {
        self.db_dir().join(DB_FILE_NAME)
    }

    /// Directory scanned for `NNNN_slug.sql` migration units.
    pub fn migrations_dir(&self) -> PathBuf {
        self.db_dir().join(MIGRATIONS_DIR_NAME)
    }

    pub fn root(&self) -> &Path {
        self.root_dir.as_path()
    }
}

#[cfg(test)]
mod tests {
    use super::StoreConfig;
    use std::path::PathBuf;

    #[test]
    fn layout_places_store_and_migrations_under_db_dir() {
        let config = StoreConfig::new("/data/virtus");
        assert_eq!(config.db_path(), PathBuf::from("/data/virtus/db/app.db"));
        assert_eq!(
            config.migrations_dir(),
            PathBuf::from("/data/virtus/db/migrations")
        );
        assert!(config.install_bundled_migrations);
    }
}
