//! Domain types for storage layer

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A row of the `hosts` table
///
/// Empty address columns are normalized to `None` on read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub name: String,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub disabled: bool,
}

/// Everything the store knows about one enabled host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    pub host: HostRecord,
    /// CNAMEs pointing at this host, sorted
    pub aliases: Vec<String>,
    /// Free-form `host_vars` overlay
    pub vars: BTreeMap<String, String>,
}

/// A group as surfaced to inventory views
///
/// Only enabled, existing hosts appear in `hosts`. A group without any
/// surfaced member is still returned with an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRecord {
    pub hosts: BTreeSet<String>,
    pub vars: BTreeMap<String, String>,
}

/// One host as produced by the DNS fact consumer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedHost {
    pub name: String,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub aliases: Vec<String>,
}

/// Result of a DNS reimport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Host rows written
    pub hosts: usize,
    /// Alias rows written
    pub aliases: usize,
    /// Hosts that were in the store but not in this import
    pub removed_hosts: usize,
    /// Hosts in this import that kept an existing disabled flag
    pub disabled_preserved: usize,
}

/// A `(host, group)` membership pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Membership {
    pub host: String,
    pub group: String,
}

impl Membership {
    pub fn new(host: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            group: group.into(),
        }
    }
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.host, self.group)
    }
}

/// Result of applying a batch of memberships
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentSummary {
    /// Pairs submitted, including ones that already existed
    pub memberships_processed: usize,
    /// Pairs that were not present before
    pub memberships_inserted: usize,
    /// Distinct groups touched by the batch
    pub groups_ensured: usize,
}
