//! CIDR-to-group rule parsing
//!
//! One rule per line: an IPv4 CIDR, whitespace, then the group name. The
//! group name is everything after the first whitespace run, so it may
//! contain spaces. Blank lines and `#` comments are skipped.
//!
//! ```text
//! # office networks
//! 10.20.0.0/16    Office
//! 10.20.30.0/24   Server VLAN 30
//! ```

use ipnet::{IpNet, Ipv4Net};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single `network -> group` mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Network with host bits cleared
    pub network: Ipv4Net,
    pub group: String,
}

impl Rule {
    pub fn contains(&self, addr: &Ipv4Addr) -> bool {
        self.network.contains(addr)
    }
}

/// Error while reading a rule file
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("line {line}: expected format 'CIDR<space>Group Name'")]
    MissingGroup { line: usize },

    #[error("line {line}: invalid CIDR {cidr:?}: {source}")]
    InvalidCidr {
        line: usize,
        cidr: String,
        #[source]
        source: ipnet::AddrParseError,
    },

    #[error("line {line}: only IPv4 CIDR allowed ({cidr:?})")]
    NotIpv4 { line: usize, cidr: String },

    #[error("no rules found")]
    NoRules,

    #[error("failed to read rule file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parse rule text, failing on the first bad line
pub fn parse_rules(text: &str) -> Result<Vec<Rule>, RuleError> {
    let mut rules = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (cidr, group) = trimmed
            .split_once(char::is_whitespace)
            .ok_or(RuleError::MissingGroup { line })?;
        let group = group.trim();
        if group.is_empty() {
            return Err(RuleError::MissingGroup { line });
        }

        let network = match cidr.parse::<IpNet>() {
            Ok(IpNet::V4(net)) => net.trunc(),
            Ok(IpNet::V6(_)) => {
                return Err(RuleError::NotIpv4 {
                    line,
                    cidr: cidr.to_string(),
                })
            }
            Err(source) => {
                return Err(RuleError::InvalidCidr {
                    line,
                    cidr: cidr.to_string(),
                    source,
                })
            }
        };

        rules.push(Rule {
            network,
            group: group.to_string(),
        });
    }

    if rules.is_empty() {
        return Err(RuleError::NoRules);
    }
    Ok(rules)
}

/// Read and parse a rule file
pub fn load_rules(path: &Path) -> Result<Vec<Rule>, RuleError> {
    let text = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rules(&text)
}
