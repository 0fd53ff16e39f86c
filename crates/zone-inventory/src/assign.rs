//! CIDR group assignment
//!
//! Every rule is tested against every enabled host with an IPv4 address;
//! overlapping networks add the host to each matching group. Memberships
//! are only ever added, so a second run with unchanged input is a no-op.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};
use zone_inventory_storage::{
    AssignmentSummary, GroupStore, HostStore, Membership, Storage, StorageError,
};

use crate::rules::Rule;

/// Outcome of one assignment run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentReport {
    /// Enabled hosts with an IPv4 address
    pub hosts_considered: usize,
    pub rules: usize,
    pub summary: AssignmentSummary,
}

/// Match `(name, ipv4)` pairs against all rules
pub fn compute_memberships(hosts: &[(String, String)], rules: &[Rule]) -> BTreeSet<Membership> {
    let mut memberships = BTreeSet::new();

    for (name, ipv4) in hosts {
        let addr: Ipv4Addr = match ipv4.trim().parse() {
            Ok(addr) => addr,
            Err(_) => {
                warn!(host = %name, ipv4 = %ipv4, "skipping host with unparseable IPv4 address");
                continue;
            }
        };

        for rule in rules.iter().filter(|r| r.contains(&addr)) {
            debug!(host = %name, network = %rule.network, group = %rule.group, "rule matched");
            memberships.insert(Membership::new(name.as_str(), rule.group.as_str()));
        }
    }

    memberships
}

/// Read assignable hosts, match them and persist the result atomically
///
/// # Errors
/// * `StorageError` - Reading hosts or applying the batch failed; nothing
///   is written in that case
pub async fn run_assignment(
    storage: &dyn Storage,
    rules: &[Rule],
) -> Result<AssignmentReport, StorageError> {
    let hosts = storage.list_assignable_hosts().await?;
    info!(hosts = hosts.len(), rules = rules.len(), "hosts loaded");

    let memberships: Vec<Membership> = compute_memberships(&hosts, rules).into_iter().collect();
    let summary = storage.apply_memberships(&memberships).await?;

    Ok(AssignmentReport {
        hosts_considered: hosts.len(),
        rules: rules.len(),
        summary,
    })
}
