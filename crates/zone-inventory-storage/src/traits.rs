//! Storage trait definitions
//!
//! - HostStore: hosts, aliases and host variables (DNS-derived, rebuilt on import)
//! - GroupStore: groups, group variables and memberships (additive)
//! - Storage: Combined interface with lifecycle management

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::StorageError;
use crate::types::{
    AssignmentSummary, GroupRecord, HostFacts, HostRecord, ImportSummary, ImportedHost, Membership,
};

/// Host, alias and host variable access
///
/// Disabled hosts are invisible to every `enabled_*` query; only
/// [`HostStore::get_host`] returns them.
#[async_trait]
pub trait HostStore: Send + Sync {
    /// All enabled hosts with their aliases and variables, sorted by name
    ///
    /// # Errors
    /// * `StorageError::Query` - Database error
    async fn list_enabled_host_facts(&self) -> Result<Vec<HostFacts>, StorageError>;

    /// One enabled host with its aliases and variables
    ///
    /// Returns `None` for both absent and disabled hosts.
    ///
    /// # Errors
    /// * `StorageError::Query` - Database error
    async fn enabled_host_facts(&self, name: &str) -> Result<Option<HostFacts>, StorageError>;

    /// Names of all enabled hosts
    ///
    /// # Errors
    /// * `StorageError::Query` - Database error
    async fn list_enabled_host_names(&self) -> Result<BTreeSet<String>, StorageError>;

    /// Enabled hosts that carry a non-empty IPv4 address, as `(name, ipv4)`
    ///
    /// # Errors
    /// * `StorageError::Query` - Database error
    async fn list_assignable_hosts(&self) -> Result<Vec<(String, String)>, StorageError>;

    /// Raw host row, disabled or not
    ///
    /// # Errors
    /// * `StorageError::Query` - Database error
    async fn get_host(&self, name: &str) -> Result<Option<HostRecord>, StorageError>;

    /// Replace the DNS-derived data with a fresh import
    ///
    /// Runs in a single transaction. Existing `disabled` flags, host
    /// variables and group memberships survive for every host present in
    /// the new import. Hosts missing from the import are removed together
    /// with their dependent rows.
    ///
    /// # Errors
    /// * `StorageError::Transaction` - Begin/commit failed
    /// * `StorageError::Query` - Any statement failed (nothing is applied)
    async fn replace_dns_facts(
        &self,
        hosts: &[ImportedHost],
    ) -> Result<ImportSummary, StorageError>;

    /// Set or clear the soft-delete flag of a host
    ///
    /// # Errors
    /// * `StorageError::NotFound` - Host doesn't exist
    /// * `StorageError::Query` - Database error
    async fn set_host_disabled(&self, name: &str, disabled: bool) -> Result<(), StorageError>;

    /// Insert or overwrite one host variable
    ///
    /// # Errors
    /// * `StorageError::NotFound` - Host doesn't exist
    /// * `StorageError::Query` - Database error
    async fn set_host_var(&self, host: &str, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Group, group variable and membership access
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// All groups with surfaced members and variables
    ///
    /// Memberships pointing at disabled or missing hosts are filtered out.
    /// Groups left without members are still returned.
    ///
    /// # Errors
    /// * `StorageError::Query` - Database error
    async fn load_groups(&self) -> Result<BTreeMap<String, GroupRecord>, StorageError>;

    /// Insert memberships (and their groups) if absent, atomically
    ///
    /// Existing rows are never modified or removed.
    ///
    /// # Errors
    /// * `StorageError::Transaction` - Begin/commit failed
    /// * `StorageError::Query` - Any insert failed (nothing is applied)
    async fn apply_memberships(
        &self,
        memberships: &[Membership],
    ) -> Result<AssignmentSummary, StorageError>;

    /// Create a group if it doesn't exist yet
    ///
    /// # Errors
    /// * `StorageError::Query` - Database error
    async fn ensure_group(&self, name: &str) -> Result<(), StorageError>;

    /// Insert or overwrite one group variable, creating the group if needed
    ///
    /// # Errors
    /// * `StorageError::Query` - Database error
    async fn set_group_var(&self, group: &str, key: &str, value: &str)
        -> Result<(), StorageError>;

    /// Total number of membership rows, including stale ones
    ///
    /// # Errors
    /// * `StorageError::Query` - Database error
    async fn count_memberships(&self) -> Result<i64, StorageError>;
}

/// Combined storage interface with lifecycle management
#[async_trait]
pub trait Storage: HostStore + GroupStore {
    /// Backend name for logging
    fn backend_name(&self) -> &'static str;

    /// Create the schema if missing and apply legacy migrations
    ///
    /// Idempotent - safe to call multiple times.
    ///
    /// # Errors
    /// * `StorageError::Migration` - Schema setup failed
    async fn initialize(&self) -> Result<(), StorageError>;

    /// Drop every table and view, recreate the schema and import `hosts`
    ///
    /// One transaction: on any failure the previous contents, curated
    /// groups and memberships included, are left untouched.
    ///
    /// # Errors
    /// * `StorageError::Transaction` - Begin/commit failed
    /// * `StorageError::Migration` - Drop or schema creation failed
    /// * `StorageError::Query` - Any insert failed
    async fn wipe_and_replace_dns_facts(
        &self,
        hosts: &[ImportedHost],
    ) -> Result<ImportSummary, StorageError>;

    /// Check storage connectivity and that the schema exists
    ///
    /// # Errors
    /// * `StorageError::Connection` - Backend unreachable or schema missing
    async fn health_check(&self) -> Result<(), StorageError>;

    /// Close storage connections
    ///
    /// After calling close, no other operations should be performed.
    async fn close(&self) -> Result<(), StorageError>;
}
