//! CLI module for cloudsweep
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `audit` - Reconcile every configured account and region and print a summary
//! - `report` - Reconcile and deliver the cleanup report to Slack
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Audit from a directory of snapshots
//! cloudsweep audit --snapshot-dir ./snapshots
//!
//! # Render the report without posting it
//! cloudsweep report --dry-run
//!
//! # Generate shell completions
//! cloudsweep completions bash > ~/.bash_completion.d/cloudsweep
//! ```

pub mod audit;
pub mod completions;
pub mod config;
pub mod output;
pub mod report;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::PoolMode;

/// cloudsweep - find cloud resources nothing owns
#[derive(Parser, Debug)]
#[command(
    name = "cloudsweep",
    version,
    about = "Reconciles cloud inventory ownership and reports orphaned resources"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile inventory and print an ownership summary
    Audit(AuditArgs),
    /// Reconcile inventory and post the cleanup report
    Report(ReportArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// How managed-database entities are shared between regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Every region reconciles against its own copy
    RegionScoped,
    /// One pool is carried across regions in order
    Shared,
}

impl From<ModeArg> for PoolMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::RegionScoped => PoolMode::RegionScoped,
            ModeArg::Shared => PoolMode::Shared,
        }
    }
}

/// Options shared by every command that runs an analysis
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to configuration file [default: cloudsweep.toml if present]
    #[arg(short, long, env = "CLOUDSWEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding region and managed DB snapshots
    #[arg(short, long)]
    pub snapshot_dir: Option<PathBuf>,

    /// Override the pool mode
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Override how many regions are fetched at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Restrict the audit to these regions (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List every orphaned instance and volume
    #[arg(long)]
    pub orphans: bool,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Print the report instead of posting it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "cloudsweep.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
