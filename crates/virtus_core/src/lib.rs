//! Local persistence core for the Virtus coaching app.
//! Owns the store file, its schema history and every query the UI runs.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod text;

pub use config::StoreConfig;
pub use db::{bootstrap, open_db_in_memory, DbError, DbResult, StoreHandle};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::client::{Client, ClientId};
pub use model::exercise::{Exercise, ExerciseId};
pub use model::invoice::{Invoice, InvoiceId};
pub use model::session::{Session, SessionExercise, SessionId};
pub use repo::{RepoError, RepoResult};
pub use search::exercise_search::ExerciseSearch;
pub use text::normalize::{normalize, slugify, Normalizer};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
