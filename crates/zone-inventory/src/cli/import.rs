//! `zone-import`: load a zone transfer from stdin
//!
//! ```text
//! dig @ns1 example.com AXFR | zone-import --db inventory.db
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing::info;
use zone_inventory_storage::{HostStore, ImportSummary, ImportedHost, Storage};

use super::{finish, open_storage, CommonArgs, EXIT_ERROR};
use crate::tracing_setup;
use crate::zone::read_zone;

#[derive(Parser, Debug)]
#[command(name = "zone-import")]
#[command(about = "Import `dig AXFR` output from stdin into the inventory database", long_about = None)]
pub struct ImportCli {
    /// Drop and recreate all tables before importing
    #[arg(long)]
    pub wipe: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn run() -> Result<ExitCode> {
    let cli = ImportCli::parse();
    tracing_setup::init("info", cli.common.verbose);

    // Read everything before touching the database
    let hosts = match read_zone(BufReader::new(tokio::io::stdin())).await {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(ExitCode::from(EXIT_ERROR));
        }
    };

    let storage = match open_storage(&cli.common).await {
        Ok(s) => s,
        Err(code) => return Ok(code),
    };

    let result = import_hosts(storage.as_ref(), &hosts, cli.wipe)
        .await
        .map(|summary| {
            println!(
                "Import complete. Hosts: {}, CNAMEs: {}",
                summary.hosts, summary.aliases
            );
        });
    Ok(finish(storage.as_ref(), result).await)
}

/// Replace the DNS-derived facts, optionally starting from an empty schema
///
/// With `wipe` the drop and the import share one transaction.
pub async fn import_hosts(
    storage: &dyn Storage,
    hosts: &[ImportedHost],
    wipe: bool,
) -> Result<ImportSummary> {
    if wipe {
        let summary = storage
            .wipe_and_replace_dns_facts(hosts)
            .await
            .context("wipe and import failed")?;
        info!("database wiped");
        return Ok(summary);
    }

    storage
        .replace_dns_facts(hosts)
        .await
        .context("import failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::parse_zone;
    use zone_inventory_storage::{create_storage, GroupStore, Membership, StorageConfig};

    const ZONE: &str = "\
gw.example.   300 IN A     10.0.0.1
nas.example.  300 IN A     10.0.0.2
files.example. 300 IN CNAME nas.example.
";

    #[test]
    fn test_cli_parse_wipe() {
        let cli = ImportCli::try_parse_from(["zone-import", "--wipe", "--db", "x.db"]).unwrap();
        assert!(cli.wipe);
        assert_eq!(cli.common.db.as_deref(), Some("x.db"));

        let cli = ImportCli::try_parse_from(["zone-import"]).unwrap();
        assert!(!cli.wipe);
    }

    #[tokio::test]
    async fn test_import_hosts_summary() {
        let storage = create_storage(&StorageConfig::sqlite_memory()).await.unwrap();

        let summary = import_hosts(storage.as_ref(), &parse_zone(ZONE), false)
            .await
            .unwrap();
        assert_eq!(summary.hosts, 2);
        assert_eq!(summary.aliases, 1);
    }

    #[tokio::test]
    async fn test_wipe_drops_curated_data() {
        let storage = create_storage(&StorageConfig::sqlite_memory()).await.unwrap();
        let hosts = parse_zone(ZONE);
        import_hosts(storage.as_ref(), &hosts, false).await.unwrap();
        storage
            .apply_memberships(&[Membership::new("nas.example", "storage")])
            .await
            .unwrap();
        storage.set_host_disabled("gw.example", true).await.unwrap();

        // Plain reimport keeps both
        import_hosts(storage.as_ref(), &hosts, false).await.unwrap();
        assert_eq!(storage.count_memberships().await.unwrap(), 1);
        assert!(storage.get_host("gw.example").await.unwrap().unwrap().disabled);

        // Wiping starts over
        import_hosts(storage.as_ref(), &hosts, true).await.unwrap();
        assert_eq!(storage.count_memberships().await.unwrap(), 0);
        assert!(storage.load_groups().await.unwrap().is_empty());
        assert!(!storage.get_host("gw.example").await.unwrap().unwrap().disabled);
    }

    #[tokio::test]
    async fn test_failed_wipe_keeps_existing_data() {
        let storage = create_storage(&StorageConfig::sqlite_memory()).await.unwrap();
        import_hosts(storage.as_ref(), &parse_zone(ZONE), false)
            .await
            .unwrap();
        storage
            .apply_memberships(&[Membership::new("nas.example", "curated")])
            .await
            .unwrap();

        // Both names claim the same alias, so the import fails after the drop
        let bad = [
            ImportedHost {
                name: "a.example".into(),
                ipv4: Some("10.0.0.8".into()),
                aliases: vec!["dup.example".into()],
                ..Default::default()
            },
            ImportedHost {
                name: "b.example".into(),
                ipv4: Some("10.0.0.9".into()),
                aliases: vec!["dup.example".into()],
                ..Default::default()
            },
        ];
        assert!(import_hosts(storage.as_ref(), &bad, true).await.is_err());

        let names: Vec<String> = storage
            .list_enabled_host_names()
            .await
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(names, vec!["gw.example", "nas.example"]);
        assert_eq!(storage.count_memberships().await.unwrap(), 1);
        assert!(storage.load_groups().await.unwrap()["curated"]
            .hosts
            .contains("nas.example"));
    }
}
