//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{order_cmd, plan_cmd};
use crate::order::Mode;
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "pkgorder")]
#[command(author, version, about = "Install ordering for package transactions")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project config file (skips the pkgorder.toml lookup)
    #[arg(long, global = true, env = "PKGORDER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Order the packages of a snapshot in one mode
    Order {
        /// Snapshot file (JSON or YAML)
        snapshot: PathBuf,

        /// Ordering mode
        #[arg(long, short, value_enum, default_value = "unpack")]
        mode: Mode,

        /// File-group map used to pre-sort unpacking
        #[arg(long)]
        groups: Option<PathBuf>,

        /// Packages to configure right after unpacking
        #[arg(long, value_name = "NAME")]
        immediate: Vec<String>,
    },

    /// Plan a whole transaction: critical, unpack and configure
    Plan {
        /// Snapshot file (JSON or YAML)
        snapshot: PathBuf,

        /// File-group map used to pre-sort unpacking
        #[arg(long)]
        groups: Option<PathBuf>,
    },

    /// Report pre-dependency cycles among installing packages
    Check {
        /// Snapshot file (JSON or YAML)
        snapshot: PathBuf,
    },

    /// Show candidates in pre-sort order with their score keys
    Score {
        /// Snapshot file (JSON or YAML)
        snapshot: PathBuf,

        /// Mode whose candidates are listed
        #[arg(long, short, value_enum, default_value = "unpack")]
        mode: Mode,

        /// File-group map used to pre-sort unpacking
        #[arg(long)]
        groups: Option<PathBuf>,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    let format = cli
        .format
        .unwrap_or_else(|| config.global.default_format.into());
    let output = Output::new(format, cli.verbose);

    output.verbose("pkgorder starting");
    match &config.source {
        Some(path) => output.verbose_ctx("config", &format!("Loaded {}", path.display())),
        None => output.verbose_ctx("config", "No project config, using defaults"),
    }

    match cli.command {
        Commands::Order {
            snapshot,
            mode,
            groups,
            immediate,
        } => order_cmd::order(&output, &config, &snapshot, mode, groups.as_deref(), &immediate)?,

        Commands::Plan { snapshot, groups } => {
            plan_cmd::plan(&output, &config, &snapshot, groups.as_deref())?
        }

        Commands::Check { snapshot } => plan_cmd::check(&output, &snapshot)?,

        Commands::Score {
            snapshot,
            mode,
            groups,
        } => order_cmd::score(&output, &config, &snapshot, mode, groups.as_deref())?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
