//! Dynamic Ansible inventory built from DNS zone transfers
//!
//! The library is shared by three binaries:
//!
//! - `zone-import` reads `dig AXFR` output on stdin and replaces the
//!   DNS-derived host facts in the store ([`zone`])
//! - `zone-assign` derives group memberships from CIDR rules ([`rules`],
//!   [`assign`])
//! - `zone-inventory` answers `--list` and `--host` for Ansible ([`view`])
//!
//! All of them resolve the database location the same way ([`config`]).

pub mod assign;
pub mod cli;
pub mod config;
pub mod rules;
pub mod tracing_setup;
pub mod view;
pub mod zone;

pub use assign::{compute_memberships, run_assignment, AssignmentReport};
pub use config::DatabaseConfig;
pub use rules::{load_rules, parse_rules, Rule, RuleError};
pub use view::{build_host_vars, build_inventory, HostVars, InventoryDocument};
pub use zone::{parse_zone, read_zone, ZoneError};
