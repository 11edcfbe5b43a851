//! Inventory Housekeeping
//!
//! Applies the configured retention rules to the inventory history of a site
//! and removes data of hosts that no longer exist.

use anyhow::{Context, Result};
use clap::Parser;
use common::cli::{CommonArgs, CommonCommands, utils};
use common::hosts::collect_host_names;
use housekeeping::Housekeeping;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Reference time in unix seconds, defaults to the current time
    #[arg(long)]
    now: Option<i64>,

    /// Log what would be deleted without deleting anything
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<CommonCommands>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    utils::init_logging(&args.common);

    let mut config = utils::load_config(&args.common)?;
    if args.dry_run {
        config.dry_run = true;
    }

    let command = args.command.unwrap_or_default();
    if utils::handle_common_command(&command, &config)? {
        return Ok(());
    }

    let housekeeping = Housekeeping::new(&config).context("Invalid housekeeping configuration")?;
    let host_names = collect_host_names(&config.hosts);
    let now = args.now.unwrap_or_else(|| chrono::Utc::now().timestamp());

    tracing::info!(
        omd_root = %config.omd_root.display(),
        hosts = host_names.len(),
        now,
        "Running inventory housekeeping"
    );

    let report = housekeeping
        .run(&host_names, now)
        .context("Inventory housekeeping failed")?;
    report.log();

    Ok(())
}
