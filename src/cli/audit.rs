//! Audit command implementation

use std::path::Path;
use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::cli::{output, AuditArgs, RunArgs};
use crate::config::SweepConfig;
use crate::source::{ControlPlaneClient, InventorySource, ManagedDbSource, SnapshotDirSource};

const DEFAULT_CONFIG_PATH: &str = "cloudsweep.toml";

/// Load configuration with CLI overrides
///
/// An explicit `--config` must exist. Without one, `cloudsweep.toml` in the
/// working directory is used when present, defaults otherwise.
pub fn load_config_with_overrides(
    args: &RunArgs,
) -> Result<SweepConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => SweepConfig::load(Some(path))?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            SweepConfig::load(Some(Path::new(DEFAULT_CONFIG_PATH)))?
        }
        None => {
            tracing::debug!("Config file not found, using defaults");
            SweepConfig::default()
        }
    };

    config = config.with_env_overrides();

    if let Some(ref dir) = args.snapshot_dir {
        config.source.snapshot_dir = Some(dir.clone());
    }
    if let Some(mode) = args.mode {
        config.reconcile.pool_mode = mode.into();
    }
    if let Some(concurrency) = args.concurrency {
        config.reconcile.concurrency = concurrency;
    }
    if !args.regions.is_empty() {
        config.regions.enabled = args.regions.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Pick the inventory and managed DB sources the configuration names.
///
/// Region snapshots always come from the snapshot directory. Managed DB
/// entities come from the control plane when one is configured.
pub fn build_analyzer(config: SweepConfig) -> Result<Analyzer, Box<dyn std::error::Error>> {
    let Some(dir) = config.source.snapshot_dir.clone() else {
        return Err(
            "No inventory source configured. Set source.snapshot_dir or pass --snapshot-dir."
                .into(),
        );
    };
    let snapshots = Arc::new(SnapshotDirSource::new(dir));
    let inventory: Arc<dyn InventorySource> = snapshots.clone();

    let managed_db: Arc<dyn ManagedDbSource> = match &config.source.control_plane {
        Some(control_plane) => Arc::new(ControlPlaneClient::from_config(control_plane)?),
        None => snapshots,
    };

    Ok(Analyzer::new(config, inventory, managed_db))
}

/// Handle `cloudsweep audit` command
pub async fn run_audit(args: AuditArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args.run)?;
    crate::logging::init(&config.logging)?;
    tracing::debug!(?config, "Loaded configuration");

    let analyzer = build_analyzer(config)?;
    let global = analyzer.analyse().await?;

    if args.json {
        println!("{}", output::format_audit_json(&global)?);
        return Ok(());
    }

    println!("{}", output::format_summary_table(&global.summary()));
    println!("{}", output::format_regions_table(&global));
    if args.orphans {
        println!("{}", output::format_orphans_table(&global));
    }

    Ok(())
}
