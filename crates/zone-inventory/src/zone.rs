//! DNS zone transfer consumer
//!
//! Turns `dig AXFR` presentation output into [`ImportedHost`] facts:
//!
//! ```text
//! web01.example.com.  3600 IN A     10.0.0.10
//! web01.example.com.  3600 IN AAAA  fd00::10
//! www.example.com.    3600 IN CNAME web01.example.com.
//! ```

use std::collections::BTreeMap;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;
use zone_inventory_storage::ImportedHost;

/// Owner names containing this marker are ACME challenge records
const ACME_MARKER: &str = "_acme";

#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("failed to read zone data: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Default)]
struct PendingHost {
    ipv4: Option<String>,
    ipv6: Option<String>,
}

/// Accumulates records; hosts and aliases are resolved in [`ZoneBuilder::finish`]
#[derive(Debug, Default)]
struct ZoneBuilder {
    hosts: BTreeMap<String, PendingHost>,
    /// alias -> canonical
    cnames: BTreeMap<String, String>,
}

impl ZoneBuilder {
    fn push_line(&mut self, line: &str) {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            return;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < 5 {
            return;
        }

        let owner = strip_root(fields[0]);
        if owner.contains(ACME_MARKER) {
            return;
        }
        let value = strip_root(fields[4]);

        match fields[3] {
            "A" => {
                self.hosts.entry(owner.to_string()).or_default().ipv4 = Some(value.to_string());
            }
            "AAAA" => {
                self.hosts.entry(owner.to_string()).or_default().ipv6 = Some(value.to_string());
            }
            "CNAME" => {
                self.cnames.insert(owner.to_string(), value.to_string());
            }
            _ => {}
        }
    }

    fn finish(self) -> Vec<ImportedHost> {
        let mut hosts: BTreeMap<String, ImportedHost> = self
            .hosts
            .into_iter()
            .filter(|(_, h)| has_value(&h.ipv4) || has_value(&h.ipv6))
            .map(|(name, h)| {
                let host = ImportedHost {
                    name: name.clone(),
                    ipv4: h.ipv4.filter(|v| !v.is_empty()),
                    ipv6: h.ipv6.filter(|v| !v.is_empty()),
                    aliases: Vec::new(),
                };
                (name, host)
            })
            .collect();

        // BTreeMap iteration keeps each alias list sorted
        for (alias, canonical) in self.cnames {
            match hosts.get_mut(&canonical) {
                Some(host) => host.aliases.push(alias),
                None => debug!(%alias, %canonical, "dropping CNAME without addressed target"),
            }
        }

        hosts.into_values().collect()
    }
}

fn strip_root(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

fn has_value(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Parse zone text already held in memory
pub fn parse_zone(text: &str) -> Vec<ImportedHost> {
    let mut builder = ZoneBuilder::default();
    for line in text.lines() {
        builder.push_line(line);
    }
    builder.finish()
}

/// Read zone data line by line until EOF
///
/// # Errors
/// * `ZoneError::Io` - The reader failed (including invalid UTF-8)
pub async fn read_zone<R>(reader: R) -> Result<Vec<ImportedHost>, ZoneError>
where
    R: AsyncBufRead + Unpin,
{
    let mut builder = ZoneBuilder::default();
    let mut lines = reader.lines();
    let mut count = 0usize;
    while let Some(line) = lines.next_line().await? {
        builder.push_line(&line);
        count += 1;
    }
    debug!(lines = count, "zone data read");
    Ok(builder.finish())
}
