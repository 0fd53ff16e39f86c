//! SQLite storage backend implementation using sqlx
//!
//! # Architecture
//!
//! - **schema**: table/index/view creation, legacy migration and drop
//! - **hosts**: hosts, CNAME aliases, host variables and the DNS reimport
//! - **groups**: groups, group variables and memberships
//!
//! # Connection Management
//!
//! The inventory tools are single-pass batch processes, so the pool holds
//! exactly one connection. For `:memory:` databases that connection is never
//! reaped, otherwise the database would vanish with it.
//!
//! # Security
//!
//! All queries use sqlx's prepared statement bindings (`bind()`). User-provided
//! data is never interpolated into query strings.

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::time::Duration;

use crate::error::StorageError;
use crate::traits::{GroupStore, HostStore, Storage};
use crate::types::{
    AssignmentSummary, GroupRecord, HostFacts, HostRecord, ImportSummary, ImportedHost, Membership,
};

mod groups;
mod hosts;
mod schema;

/// SQLite storage backend
///
/// # Examples
///
/// ```no_run
/// use zone_inventory_storage::backends::sqlite::SqliteStorage;
/// use zone_inventory_storage::Storage;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // In-memory database for testing
/// let storage = SqliteStorage::new(":memory:").await?;
/// storage.initialize().await?;
///
/// // File-based database for production
/// let storage = SqliteStorage::new("/var/lib/zone-inventory/inventory.db").await?;
/// storage.initialize().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open a SQLite database
    ///
    /// # Arguments
    ///
    /// * `path` - Database path or `:memory:` for an in-memory database.
    ///   File databases are created if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the database cannot be opened.
    pub async fn new(path: &str) -> Result<Self, StorageError> {
        let options = if path == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| StorageError::connection("invalid SQLite URL", e))?
        } else {
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };
        // Cascades on hosts/groups depend on this
        let options = options.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                StorageError::connection(format!("failed to open SQLite database {path}"), e)
            })?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool for internal use
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl HostStore for SqliteStorage {
    async fn list_enabled_host_facts(&self) -> Result<Vec<HostFacts>, StorageError> {
        self.list_enabled_host_facts_impl().await
    }

    async fn enabled_host_facts(&self, name: &str) -> Result<Option<HostFacts>, StorageError> {
        self.enabled_host_facts_impl(name).await
    }

    async fn list_enabled_host_names(&self) -> Result<BTreeSet<String>, StorageError> {
        self.list_enabled_host_names_impl().await
    }

    async fn list_assignable_hosts(&self) -> Result<Vec<(String, String)>, StorageError> {
        self.list_assignable_hosts_impl().await
    }

    async fn get_host(&self, name: &str) -> Result<Option<HostRecord>, StorageError> {
        self.get_host_impl(name).await
    }

    async fn replace_dns_facts(
        &self,
        hosts: &[ImportedHost],
    ) -> Result<ImportSummary, StorageError> {
        self.replace_dns_facts_impl(hosts).await
    }

    async fn set_host_disabled(&self, name: &str, disabled: bool) -> Result<(), StorageError> {
        self.set_host_disabled_impl(name, disabled).await
    }

    async fn set_host_var(&self, host: &str, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_host_var_impl(host, key, value).await
    }
}

#[async_trait]
impl GroupStore for SqliteStorage {
    async fn load_groups(&self) -> Result<BTreeMap<String, GroupRecord>, StorageError> {
        self.load_groups_impl().await
    }

    async fn apply_memberships(
        &self,
        memberships: &[Membership],
    ) -> Result<AssignmentSummary, StorageError> {
        self.apply_memberships_impl(memberships).await
    }

    async fn ensure_group(&self, name: &str) -> Result<(), StorageError> {
        self.ensure_group_impl(name).await
    }

    async fn set_group_var(
        &self,
        group: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        self.set_group_var_impl(group, key, value).await
    }

    async fn count_memberships(&self) -> Result<i64, StorageError> {
        self.count_memberships_impl().await
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn initialize(&self) -> Result<(), StorageError> {
        schema::initialize_schema(self).await
    }

    async fn wipe_and_replace_dns_facts(
        &self,
        hosts: &[ImportedHost],
    ) -> Result<ImportSummary, StorageError> {
        self.wipe_and_replace_dns_facts_impl(hosts).await
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1")
            .execute(self.pool())
            .await
            .map_err(|e| StorageError::connection("health check: database connection failed", e))?;

        let table_exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM sqlite_master
                WHERE type = 'table' AND name = 'hosts'
            )
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(|e| StorageError::connection("health check: failed to verify schema", e))?;

        if !table_exists {
            return Err(StorageError::connection(
                "health check: schema not initialized (hosts table missing)",
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "schema not initialized - call initialize() first",
                ),
            ));
        }

        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }
}
