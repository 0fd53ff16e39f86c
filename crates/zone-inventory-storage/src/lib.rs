//! Storage layer for zone-inventory
//!
//! Holds the normalized facts the inventory is built from: hosts with their
//! addresses and CNAME aliases (rebuilt on every DNS import), plus groups,
//! group variables, host variables and group memberships (curated or derived
//! from CIDR rules, never wiped by an import).
//!
//! # Supported Backends
//!
//! - **SQLite** (feature: `sqlite`, default)
//!
//! # Examples
//!
//! ```no_run
//! use zone_inventory_storage::{create_storage, HostStore, StorageConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorageConfig::from_url("sqlite:///var/lib/zone-inventory/inventory.db")?;
//! let storage = create_storage(&config).await?;
//! let hosts = storage.list_enabled_host_names().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod traits;
mod types;

pub mod backends;

// Re-exports
pub use config::{BackendType, ConfigError, StorageConfig};
pub use error::StorageError;
pub use traits::{GroupStore, HostStore, Storage};
pub use types::{
    AssignmentSummary, GroupRecord, HostFacts, HostRecord, ImportSummary, ImportedHost, Membership,
};

/// Create storage from configuration
///
/// Opens the backend named by the configuration and initializes the schema.
///
/// # Errors
///
/// Returns `StorageError::InvalidConnectionString` if the backend type
/// is not compiled in (missing feature flag).
/// Returns `StorageError::Connection` if the database cannot be opened.
pub async fn create_storage(
    config: &StorageConfig,
) -> Result<std::sync::Arc<dyn Storage>, StorageError> {
    let storage: std::sync::Arc<dyn Storage> = match config.backend {
        #[cfg(feature = "sqlite")]
        BackendType::Sqlite => std::sync::Arc::new(
            backends::sqlite::SqliteStorage::new(&config.connection_string).await?,
        ),
        #[cfg(not(feature = "sqlite"))]
        BackendType::Sqlite => {
            return Err(StorageError::InvalidConnectionString(
                "SQLite backend not compiled in (enable 'sqlite' feature)".into(),
            ))
        }
    };

    storage.initialize().await?;
    tracing::debug!(
        backend = storage.backend_name(),
        database = %config.connection_string,
        "storage initialized"
    );
    Ok(storage)
}
