//! Host, alias and host variable queries for SQLite
//!
//! Bulk listings use one query per table and join in memory, instead of
//! one alias and one variable query per host.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

use super::{schema, SqliteStorage};
use crate::error::StorageError;
use crate::types::{HostFacts, HostRecord, ImportSummary, ImportedHost};

fn row_to_host_record(row: &SqliteRow) -> Result<HostRecord, StorageError> {
    let name: String = row
        .try_get("name")
        .map_err(|e| StorageError::query("failed to read host name", e))?;
    let ipv4: Option<String> = row
        .try_get("ipv4")
        .map_err(|e| StorageError::query("failed to read host ipv4", e))?;
    let ipv6: Option<String> = row
        .try_get("ipv6")
        .map_err(|e| StorageError::query("failed to read host ipv6", e))?;
    let disabled: i64 = row
        .try_get("disabled")
        .map_err(|e| StorageError::query("failed to read host disabled flag", e))?;

    Ok(HostRecord {
        name,
        ipv4: ipv4.filter(|s| !s.is_empty()),
        ipv6: ipv6.filter(|s| !s.is_empty()),
        disabled: disabled != 0,
    })
}

/// Empty strings are stored as NULL
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Write an import on an open transaction
///
/// Host rows are upserted rather than deleted and reinserted: deleting a
/// host cascades into `host_groups` and `host_vars`, which must survive.
async fn write_dns_facts(
    conn: &mut SqliteConnection,
    hosts: &[ImportedHost],
) -> Result<ImportSummary, StorageError> {
    let existing: Vec<(String, i64)> = sqlx::query_as("SELECT name, disabled FROM hosts")
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| StorageError::query("failed to read existing hosts", e))?;

    let incoming: HashSet<&str> = hosts.iter().map(|h| h.name.as_str()).collect();
    let mut summary = ImportSummary::default();

    sqlx::query("DELETE FROM cnames")
        .execute(&mut *conn)
        .await
        .map_err(|e| StorageError::query("failed to clear cnames", e))?;

    for (name, disabled) in &existing {
        if incoming.contains(name.as_str()) {
            if *disabled != 0 {
                summary.disabled_preserved += 1;
            }
            continue;
        }
        sqlx::query("DELETE FROM hosts WHERE name = ?")
            .bind(name)
            .execute(&mut *conn)
            .await
            .map_err(|e| StorageError::query(format!("failed to remove host {name}"), e))?;
        debug!(host = %name, "host no longer in zone, removed");
        summary.removed_hosts += 1;
    }

    for host in hosts {
        sqlx::query(
            r#"
            INSERT INTO hosts(name, ipv4, ipv6) VALUES(?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET ipv4 = excluded.ipv4, ipv6 = excluded.ipv6
            "#,
        )
        .bind(&host.name)
        .bind(non_empty(&host.ipv4))
        .bind(non_empty(&host.ipv6))
        .execute(&mut *conn)
        .await
        .map_err(|e| StorageError::query(format!("failed to insert host {}", host.name), e))?;
        summary.hosts += 1;

        for alias in &host.aliases {
            sqlx::query("INSERT INTO cnames(alias, canonical) VALUES(?, ?)")
                .bind(alias)
                .bind(&host.name)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    StorageError::query(
                        format!("failed to insert cname {} -> {}", alias, host.name),
                        e,
                    )
                })?;
            summary.aliases += 1;
        }
    }

    Ok(summary)
}

fn log_import(summary: &ImportSummary, wiped: bool) {
    info!(
        hosts = summary.hosts,
        aliases = summary.aliases,
        removed = summary.removed_hosts,
        disabled_preserved = summary.disabled_preserved,
        wiped,
        "DNS facts replaced"
    );
}

impl SqliteStorage {
    pub(super) async fn list_enabled_host_facts_impl(
        &self,
    ) -> Result<Vec<HostFacts>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT name, ipv4, ipv6, disabled
            FROM hosts
            WHERE disabled = 0
            ORDER BY name
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::query("failed to list enabled hosts", e))?;

        let alias_rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT c.canonical, c.alias
            FROM cnames c
            JOIN hosts h ON h.name = c.canonical
            WHERE h.disabled = 0
            ORDER BY c.canonical, c.alias
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::query("failed to list aliases", e))?;

        let var_rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT v.host, v.key, v.value
            FROM host_vars v
            JOIN hosts h ON h.name = v.host
            WHERE h.disabled = 0
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::query("failed to list host vars", e))?;

        let mut aliases: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (canonical, alias) in alias_rows {
            aliases.entry(canonical).or_default().push(alias);
        }

        let mut vars: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for (host, key, value) in var_rows {
            vars.entry(host).or_default().insert(key, value);
        }

        rows.iter()
            .map(|row| {
                let host = row_to_host_record(row)?;
                Ok(HostFacts {
                    aliases: aliases.remove(&host.name).unwrap_or_default(),
                    vars: vars.remove(&host.name).unwrap_or_default(),
                    host,
                })
            })
            .collect()
    }

    pub(super) async fn enabled_host_facts_impl(
        &self,
        name: &str,
    ) -> Result<Option<HostFacts>, StorageError> {
        let host = match self.get_host_impl(name).await? {
            Some(host) if !host.disabled => host,
            _ => return Ok(None),
        };

        let aliases: Vec<String> =
            sqlx::query_scalar("SELECT alias FROM cnames WHERE canonical = ? ORDER BY alias")
                .bind(name)
                .fetch_all(self.pool())
                .await
                .map_err(|e| StorageError::query("failed to load aliases", e))?;

        let var_rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM host_vars WHERE host = ?")
                .bind(name)
                .fetch_all(self.pool())
                .await
                .map_err(|e| StorageError::query("failed to load host vars", e))?;

        Ok(Some(HostFacts {
            host,
            aliases,
            vars: var_rows.into_iter().collect(),
        }))
    }

    pub(super) async fn list_enabled_host_names_impl(
        &self,
    ) -> Result<BTreeSet<String>, StorageError> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM hosts WHERE disabled = 0")
                .fetch_all(self.pool())
                .await
                .map_err(|e| StorageError::query("failed to list host names", e))?;

        Ok(names.into_iter().collect())
    }

    pub(super) async fn list_assignable_hosts_impl(
        &self,
    ) -> Result<Vec<(String, String)>, StorageError> {
        sqlx::query_as(
            r#"
            SELECT name, ipv4
            FROM hosts
            WHERE disabled = 0 AND ipv4 IS NOT NULL AND ipv4 <> ''
            ORDER BY name
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::query("failed to list IPv4 hosts", e))
    }

    pub(super) async fn get_host_impl(
        &self,
        name: &str,
    ) -> Result<Option<HostRecord>, StorageError> {
        let row = sqlx::query("SELECT name, ipv4, ipv6, disabled FROM hosts WHERE name = ?")
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StorageError::query("failed to get host", e))?;

        row.as_ref().map(row_to_host_record).transpose()
    }

    /// Reimport DNS facts in one transaction
    ///
    /// Dropping the transaction on an error path rolls everything back.
    pub(super) async fn replace_dns_facts_impl(
        &self,
        hosts: &[ImportedHost],
    ) -> Result<ImportSummary, StorageError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StorageError::transaction("failed to begin import transaction", e))?;

        let summary = write_dns_facts(&mut tx, hosts).await?;

        tx.commit()
            .await
            .map_err(|e| StorageError::transaction("failed to commit import", e))?;

        log_import(&summary, false);
        Ok(summary)
    }

    /// Drop the schema, recreate it and import, all in one transaction
    ///
    /// SQLite DDL is transactional, so a failed import leaves the previous
    /// tables, groups and memberships in place.
    pub(super) async fn wipe_and_replace_dns_facts_impl(
        &self,
        hosts: &[ImportedHost],
    ) -> Result<ImportSummary, StorageError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StorageError::transaction("failed to begin wipe transaction", e))?;

        schema::drop_objects(&mut tx).await?;
        schema::create_objects(&mut tx).await?;
        let summary = write_dns_facts(&mut tx, hosts).await?;

        tx.commit()
            .await
            .map_err(|e| StorageError::transaction("failed to commit wipe and import", e))?;

        log_import(&summary, true);
        Ok(summary)
    }

    pub(super) async fn set_host_disabled_impl(
        &self,
        name: &str,
        disabled: bool,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE hosts SET disabled = ? WHERE name = ?")
            .bind(i64::from(disabled))
            .bind(name)
            .execute(self.pool())
            .await
            .map_err(|e| StorageError::query("failed to update disabled flag", e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::host_not_found(name));
        }
        Ok(())
    }

    pub(super) async fn set_host_var_impl(
        &self,
        host: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        if self.get_host_impl(host).await?.is_none() {
            return Err(StorageError::host_not_found(host));
        }

        sqlx::query(
            r#"
            INSERT INTO host_vars(host, key, value) VALUES(?, ?, ?)
            ON CONFLICT(host, key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(host)
        .bind(key)
        .bind(value)
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::query("failed to set host var", e))?;

        Ok(())
    }
}
