//! `zone-assign`: derive group memberships from CIDR rules

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use super::{finish, open_storage, CommonArgs, EXIT_USAGE};
use crate::assign::{run_assignment, AssignmentReport};
use crate::rules::load_rules;
use crate::tracing_setup;

#[derive(Parser, Debug)]
#[command(name = "zone-assign")]
#[command(about = "Add hosts to groups by matching their IPv4 address against CIDR rules", long_about = None)]
pub struct AssignCli {
    /// Rule file with 'IPv4-CIDR<space>Group Name' lines
    #[arg(short, long, value_name = "PATH")]
    pub file: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn run() -> Result<ExitCode> {
    let cli = AssignCli::parse();
    tracing_setup::init("info", cli.common.verbose);

    // A broken rule file aborts before any host is touched
    let rules = match load_rules(&cli.file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Rule error: {}", e);
            return Ok(ExitCode::from(EXIT_USAGE));
        }
    };

    let storage = match open_storage(&cli.common).await {
        Ok(s) => s,
        Err(code) => return Ok(code),
    };

    let result = run_assignment(storage.as_ref(), &rules)
        .await
        .context("assignment failed")
        .map(|report| println!("{}", summary_line(&report)));
    Ok(finish(storage.as_ref(), result).await)
}

/// Run summary printed on stdout
pub fn summary_line(report: &AssignmentReport) -> String {
    format!(
        "Assignment complete. Hosts: {}, memberships processed: {}, new memberships: {}, groups: {}",
        report.hosts_considered,
        report.summary.memberships_processed,
        report.summary.memberships_inserted,
        report.summary.groups_ensured
    )
}
