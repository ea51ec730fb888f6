//! Store bootstrap entry point.
//!
//! # Responsibility
//! - Start file logging under `<data dir>/logs`.
//! - Bootstrap the store and report its schema version.
//! - Exit non-zero when the store cannot be made usable.

use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use virtus_core::{bootstrap, init_logging, LogSettings, StoreConfig};

fn main() -> ExitCode {
    let mut config = StoreConfig::from_env();
    if config.root_dir.is_relative() {
        match std::env::current_dir() {
            Ok(cwd) => config.root_dir = cwd.join(&config.root_dir),
            Err(err) => {
                eprintln!("virtus: cannot resolve working directory: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    let log_dir: PathBuf = config.root_dir.join("logs");
    let logging = LogSettings::from_env(&log_dir).and_then(|settings| init_logging(&settings));
    if let Err(err) = logging {
        // Logging is best-effort; the store is still usable without it.
        eprintln!("virtus: logging disabled: {err}");
    }

    let store = match bootstrap(&config) {
        Ok(store) => store,
        Err(err) => {
            error!("event=startup module=cli status=error error={err}");
            eprintln!("virtus: store bootstrap failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    match store.schema_version() {
        Ok(version) => {
            println!("virtus_core version={}", virtus_core::core_version());
            println!("store path={}", config.db_path().display());
            println!("schema version={version}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=startup module=cli status=error error={err}");
            eprintln!("virtus: cannot read schema version: {err}");
            ExitCode::FAILURE
        }
    }
}
