use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments shared by the housekeeping binaries
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Site root directory, overrides the configuration")]
    pub omd_root: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,
}

/// Subcommands available next to the main run
#[derive(Subcommand, Debug, Clone, Default)]
pub enum CommonCommands {
    /// Run one housekeeping pass (default behavior)
    #[default]
    Run,
    /// Show current configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
    /// Validate configuration and exit
    Validate,
    /// Show version information and exit
    Version,
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::{Configuration, HostSourceConfig, PolicyParameters};
    use anyhow::{Context, Result};
    use tracing_subscriber::EnvFilter;

    /// Initialize logging based on CLI arguments, `RUST_LOG` wins if set
    pub fn init_logging(args: &CommonArgs) {
        let level = if args.quiet {
            "warn"
        } else if args.verbose {
            "debug"
        } else {
            "info"
        };

        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
            )
            .init();
    }

    /// Load configuration, applying the CLI overrides
    pub fn load_config(args: &CommonArgs) -> Result<Configuration> {
        let mut config = match &args.config {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                Configuration::load_from_path(path).context("Failed to load configuration")?
            }
            None => Configuration::load().context("Failed to load configuration")?,
        };

        if let Some(omd_root) = &args.omd_root {
            config.omd_root = omd_root.clone();
        }

        Ok(config)
    }

    /// Display configuration in human-readable or JSON format
    pub fn display_config(config: &Configuration, json: bool) -> Result<()> {
        if json {
            let json = serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration to JSON")?;
            println!("{json}");
            return Ok(());
        }

        let housekeeping = &config.inventory_housekeeping;
        println!("Inventory Housekeeping Configuration:");
        println!("=====================================");
        println!("Site root: {}", config.omd_root.display());
        println!("Dry run: {}", config.dry_run);
        println!(
            "Abandoned file age: {}s",
            housekeeping.abandoned_file_age
        );
        match &housekeeping.default {
            Some(default) => println!(
                "Default policy: {:?} of file age {}s, {} history entries",
                default.strategy, default.file_age, default.number_of_history_entries
            ),
            None => println!("Default policy: none (unmatched hosts are skipped)"),
        }
        for rule in &housekeeping.for_hosts {
            let parameters = match &rule.parameters {
                PolicyParameters::FileAge(age) => format!("file age {age}s"),
                PolicyParameters::NumberOfHistoryEntries(count) => {
                    format!("{count} history entries")
                }
                PolicyParameters::Combined(p) => format!(
                    "{:?} of file age {}s, {} history entries",
                    p.strategy, p.file_age, p.number_of_history_entries
                ),
            };
            println!("Rule {:?}: {parameters}", rule.match_patterns);
        }
        match &config.hosts {
            HostSourceConfig::Static { names } => println!("Hosts: {} configured", names.len()),
            HostSourceConfig::File { path } => println!("Hosts: from {}", path.display()),
            HostSourceConfig::Command { program, args } => {
                println!("Hosts: from `{program} {}`", args.join(" "))
            }
        }
        Ok(())
    }

    /// Validate configuration and report any issues
    pub fn validate_config(config: &Configuration) -> Result<()> {
        tracing::info!("Validating configuration...");
        config.validate().context("Invalid configuration")?;
        tracing::info!("Configuration validation passed");
        Ok(())
    }

    /// Handle subcommands that don't run housekeeping
    pub fn handle_common_command(command: &CommonCommands, config: &Configuration) -> Result<bool> {
        match command {
            CommonCommands::Config { json } => {
                display_config(config, *json)?;
                Ok(true)
            }
            CommonCommands::Validate => {
                validate_config(config)?;
                Ok(true)
            }
            CommonCommands::Version => {
                println!("{}", version_info());
                Ok(true)
            }
            CommonCommands::Run => Ok(false),
        }
    }

    /// Standard version information
    pub fn version_info() -> String {
        format!(
            "{} {} ({})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_RUST_VERSION")
        )
    }
}
