//! Group, group variable and membership queries for SQLite

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use super::SqliteStorage;
use crate::error::StorageError;
use crate::types::{AssignmentSummary, GroupRecord, Membership};

impl SqliteStorage {
    /// Load every group with its enabled members and variables
    ///
    /// The outer joins keep groups without any surfaced member. The host
    /// join condition drops memberships of disabled hosts, and memberships
    /// whose host row is gone never match at all.
    pub(super) async fn load_groups_impl(
        &self,
    ) -> Result<BTreeMap<String, GroupRecord>, StorageError> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT g.name, h.name
            FROM groups g
            LEFT JOIN host_groups hg ON hg.grp = g.name
            LEFT JOIN hosts h ON h.name = hg.host AND h.disabled = 0
            ORDER BY g.name, h.name
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::query("failed to load group memberships", e))?;

        let mut groups: BTreeMap<String, GroupRecord> = BTreeMap::new();
        for (group, host) in rows {
            let record = groups.entry(group).or_default();
            if let Some(host) = host.filter(|h| !h.is_empty()) {
                record.hosts.insert(host);
            }
        }

        let var_rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT grp, key, value FROM group_vars")
                .fetch_all(self.pool())
                .await
                .map_err(|e| StorageError::query("failed to load group vars", e))?;

        for (group, key, value) in var_rows {
            groups.entry(group).or_default().vars.insert(key, value);
        }

        Ok(groups)
    }

    /// Insert memberships and their groups if absent, in one transaction
    ///
    /// `INSERT OR IGNORE` leaves existing rows untouched. A membership for a
    /// host that doesn't exist fails the foreign key check and aborts the
    /// whole batch.
    pub(super) async fn apply_memberships_impl(
        &self,
        memberships: &[Membership],
    ) -> Result<AssignmentSummary, StorageError> {
        if let Some(bad) = memberships
            .iter()
            .find(|m| m.host.is_empty() || m.group.is_empty())
        {
            return Err(StorageError::InvalidData(format!(
                "membership with empty host or group: {bad}"
            )));
        }

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StorageError::transaction("failed to begin assignment transaction", e))?;

        let mut ensured: BTreeSet<&str> = BTreeSet::new();
        let mut summary = AssignmentSummary::default();

        for membership in memberships {
            if ensured.insert(membership.group.as_str()) {
                sqlx::query("INSERT OR IGNORE INTO groups(name) VALUES(?)")
                    .bind(&membership.group)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        StorageError::query(
                            format!("failed to ensure group {:?}", membership.group),
                            e,
                        )
                    })?;
            }

            let result = sqlx::query("INSERT OR IGNORE INTO host_groups(host, grp) VALUES(?, ?)")
                .bind(&membership.host)
                .bind(&membership.group)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    StorageError::query(format!("failed to insert membership {membership}"), e)
                })?;

            if result.rows_affected() > 0 {
                debug!(host = %membership.host, group = %membership.group, "membership added");
                summary.memberships_inserted += 1;
            }
            summary.memberships_processed += 1;
        }
        summary.groups_ensured = ensured.len();

        tx.commit()
            .await
            .map_err(|e| StorageError::transaction("failed to commit assignment", e))?;

        info!(
            processed = summary.memberships_processed,
            inserted = summary.memberships_inserted,
            groups = summary.groups_ensured,
            "memberships applied"
        );
        Ok(summary)
    }

    pub(super) async fn ensure_group_impl(&self, name: &str) -> Result<(), StorageError> {
        if name.is_empty() {
            return Err(StorageError::InvalidData("empty group name".into()));
        }

        sqlx::query("INSERT OR IGNORE INTO groups(name) VALUES(?)")
            .bind(name)
            .execute(self.pool())
            .await
            .map_err(|e| StorageError::query("failed to ensure group", e))?;
        Ok(())
    }

    pub(super) async fn set_group_var_impl(
        &self,
        group: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        if group.is_empty() {
            return Err(StorageError::InvalidData("empty group name".into()));
        }

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StorageError::transaction("failed to begin group var transaction", e))?;

        sqlx::query("INSERT OR IGNORE INTO groups(name) VALUES(?)")
            .bind(group)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::query("failed to ensure group", e))?;

        sqlx::query(
            r#"
            INSERT INTO group_vars(grp, key, value) VALUES(?, ?, ?)
            ON CONFLICT(grp, key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(group)
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::query("failed to set group var", e))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::transaction("failed to commit group var", e))
    }

    pub(super) async fn count_memberships_impl(&self) -> Result<i64, StorageError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM host_groups")
            .fetch_one(self.pool())
            .await
            .map_err(|e| StorageError::query("failed to count memberships", e))
    }
}
