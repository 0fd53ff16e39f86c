//! Command-line front ends for the three binaries
//!
//! Each tool parses its arguments, resolves the database location (CLI >
//! env > file > default), opens the store, does one pass and closes the
//! store again on every exit path.

pub mod assign;
pub mod import;
pub mod inventory;

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, warn};
use zone_inventory_storage::{create_storage, Storage};

use crate::config::DatabaseConfig;

/// Exit codes following Unix conventions
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE: u8 = 2;

/// Options shared by every tool
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// SQLite database path or sqlite:// URL
    #[arg(long, value_name = "PATH")]
    pub db: Option<String>,

    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolve the database location and open the store
///
/// On failure the diagnostic has already been printed and the exit code
/// to return is handed back.
pub(crate) async fn open_storage(common: &CommonArgs) -> Result<Arc<dyn Storage>, ExitCode> {
    let config = match DatabaseConfig::load(common.config.as_ref(), common.db.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return Err(ExitCode::from(EXIT_USAGE));
        }
    };
    debug!(database = %config.location, source = %config.source, "database resolved");

    let storage_config = match config.storage_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return Err(ExitCode::from(EXIT_USAGE));
        }
    };

    let storage = match create_storage(&storage_config).await {
        Ok(storage) => storage,
        Err(e) => {
            eprintln!("Database error: {}", e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
    };

    if let Err(e) = storage.health_check().await {
        eprintln!("Database error: {}", e);
        if let Err(e) = storage.close().await {
            warn!(error = %e, "failed to close storage");
        }
        return Err(ExitCode::from(EXIT_ERROR));
    }

    Ok(storage)
}

/// Close the store, then turn the command result into an exit code
pub(crate) async fn finish(storage: &dyn Storage, result: Result<()>) -> ExitCode {
    if let Err(e) = storage.close().await {
        warn!(error = %e, "failed to close storage");
    }

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
