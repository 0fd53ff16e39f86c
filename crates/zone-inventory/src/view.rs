//! Inventory views for Ansible
//!
//! `--list` produces an [`InventoryDocument`]:
//!
//! ```json
//! {
//!   "_meta": { "hostvars": { "web01": { "ansible_host": "10.0.0.10" } } },
//!   "all": { "hosts": ["db01", "web01"], "vars": {} },
//!   "ungrouped": { "hosts": ["db01"] },
//!   "web": { "hosts": ["web01"], "vars": { "http_port": "80" } }
//! }
//! ```
//!
//! `--host <name>` produces the flat variable map of one host, or `{}` when
//! the host is unknown or disabled.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};
use zone_inventory_storage::{GroupStore, HostFacts, HostStore, Storage, StorageError};

/// Top-level keys owned by the document itself
const RESERVED_GROUPS: &[&str] = &["_meta", "all", "ungrouped"];

/// Merged variables of one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostVars {
    /// IPv4 if present, else IPv6, else empty
    pub ansible_host: String,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    /// Sorted CNAME aliases
    pub cnames: Vec<String>,
    /// `host_vars` entries, applied last
    pub overlay: BTreeMap<String, String>,
}

impl From<HostFacts> for HostVars {
    fn from(facts: HostFacts) -> Self {
        let ipv4 = facts.host.ipv4.filter(|v| !v.is_empty());
        let ipv6 = facts.host.ipv6.filter(|v| !v.is_empty());
        let ansible_host = ipv4.clone().or_else(|| ipv6.clone()).unwrap_or_default();

        Self {
            ansible_host,
            ipv4,
            ipv6,
            cnames: facts.aliases,
            overlay: facts.vars,
        }
    }
}

impl HostVars {
    /// Flatten into the JSON object Ansible expects
    ///
    /// Overlay keys overwrite structural ones on collision.
    pub fn into_map(self) -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        map.insert("ansible_host".to_string(), Value::String(self.ansible_host));
        if let Some(ipv4) = self.ipv4 {
            map.insert("ipv4".to_string(), Value::String(ipv4));
        }
        if let Some(ipv6) = self.ipv6 {
            map.insert("ipv6".to_string(), Value::String(ipv6));
        }
        if !self.cnames.is_empty() {
            let cnames = self.cnames.into_iter().map(Value::String).collect();
            map.insert("cnames".to_string(), Value::Array(cnames));
        }
        for (key, value) in self.overlay {
            map.insert(key, Value::String(value));
        }
        map
    }
}

/// One emitted group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupEntry {
    pub hosts: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
}

/// Full `--list` response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryDocument {
    pub hostvars: BTreeMap<String, BTreeMap<String, Value>>,
    /// Every enabled host
    pub all: Vec<String>,
    /// Enabled hosts without any group
    pub ungrouped: Vec<String>,
    pub groups: BTreeMap<String, GroupEntry>,
}

#[derive(Serialize)]
struct Meta<'a> {
    hostvars: &'a BTreeMap<String, BTreeMap<String, Value>>,
}

#[derive(Serialize)]
struct AllGroup<'a> {
    hosts: &'a [String],
    vars: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct Ungrouped<'a> {
    hosts: &'a [String],
}

impl Serialize for InventoryDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.groups.len()))?;
        map.serialize_entry(
            "_meta",
            &Meta {
                hostvars: &self.hostvars,
            },
        )?;
        map.serialize_entry(
            "all",
            &AllGroup {
                hosts: &self.all,
                vars: BTreeMap::new(),
            },
        )?;
        map.serialize_entry(
            "ungrouped",
            &Ungrouped {
                hosts: &self.ungrouped,
            },
        )?;
        for (name, group) in &self.groups {
            map.serialize_entry(name, group)?;
        }
        map.end()
    }
}

/// Build the full inventory from one read pass over the store
///
/// Groups without visible members are dropped unless
/// `include_empty_groups` is set.
///
/// # Errors
/// * `StorageError` - Any store query failed
pub async fn build_inventory(
    storage: &dyn Storage,
    include_empty_groups: bool,
) -> Result<InventoryDocument, StorageError> {
    let names = storage.list_enabled_host_names().await?;
    let facts = storage.list_enabled_host_facts().await?;
    let groups = storage.load_groups().await?;

    let hostvars = facts
        .into_iter()
        .map(|f| (f.host.name.clone(), HostVars::from(f).into_map()))
        .collect();

    let mut entries = BTreeMap::new();
    for (name, group) in groups {
        if RESERVED_GROUPS.contains(&name.as_str()) {
            warn!(group = %name, "group name collides with a reserved inventory key, not emitted");
            continue;
        }
        if group.hosts.is_empty() && !include_empty_groups {
            debug!(group = %name, "omitting empty group");
            continue;
        }
        entries.insert(
            name,
            GroupEntry {
                hosts: group.hosts.into_iter().collect(),
                vars: group.vars,
            },
        );
    }

    // Only emitted groups count toward grouped
    let grouped: BTreeSet<&str> = entries
        .values()
        .flat_map(|g: &GroupEntry| g.hosts.iter().map(String::as_str))
        .collect();
    let ungrouped = names
        .iter()
        .filter(|n| !grouped.contains(n.as_str()))
        .cloned()
        .collect();

    Ok(InventoryDocument {
        hostvars,
        all: names.into_iter().collect(),
        ungrouped,
        groups: entries,
    })
}

/// Variables of a single enabled host, empty for unknown or disabled hosts
///
/// # Errors
/// * `StorageError` - The store query failed
pub async fn build_host_vars(
    storage: &dyn Storage,
    name: &str,
) -> Result<BTreeMap<String, Value>, StorageError> {
    match storage.enabled_host_facts(name).await? {
        Some(facts) => Ok(HostVars::from(facts).into_map()),
        None => {
            debug!(host = %name, "no facts for host");
            Ok(BTreeMap::new())
        }
    }
}
