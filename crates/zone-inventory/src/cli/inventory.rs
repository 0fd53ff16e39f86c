//! `zone-inventory`: Ansible dynamic inventory script

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::process::ExitCode;
use zone_inventory_storage::Storage;

use super::{finish, open_storage, CommonArgs};
use crate::tracing_setup;
use crate::view::{build_host_vars, build_inventory};

#[derive(Parser, Debug)]
#[command(name = "zone-inventory")]
#[command(about = "Ansible dynamic inventory from the zone database", long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["list", "host"])))]
pub struct InventoryCli {
    /// Print the full inventory
    #[arg(long)]
    pub list: bool,

    /// Print the variables of one host
    #[arg(long, value_name = "NAME")]
    pub host: Option<String>,

    /// Keep groups that have no enabled members
    #[arg(long)]
    pub include_empty_groups: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn run() -> Result<ExitCode> {
    let cli = InventoryCli::parse();
    tracing_setup::init("warn", cli.common.verbose);

    let storage = match open_storage(&cli.common).await {
        Ok(s) => s,
        Err(code) => return Ok(code),
    };

    let result = render(storage.as_ref(), &cli).await.map(|json| println!("{json}"));
    Ok(finish(storage.as_ref(), result).await)
}

/// Produce the JSON text for the selected mode
pub async fn render(storage: &dyn Storage, cli: &InventoryCli) -> Result<String> {
    match &cli.host {
        Some(name) => {
            let vars = build_host_vars(storage, name)
                .await
                .with_context(|| format!("failed to load host {name:?}"))?;
            serde_json::to_string_pretty(&vars).context("failed to encode host vars")
        }
        None => {
            let doc = build_inventory(storage, cli.include_empty_groups)
                .await
                .context("failed to build inventory")?;
            serde_json::to_string_pretty(&doc).context("failed to encode inventory")
        }
    }
}
