//! Configuration module for cloudsweep
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`CLOUDSWEEP_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use cloudsweep::config::SweepConfig;
//!
//! let toml = r#"
//! [[accounts]]
//! id = "111122223333"
//!
//! [regions]
//! enabled = ["eu-west-1"]
//! "#;
//! let config: SweepConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.regions.enabled, vec!["eu-west-1"]);
//! ```

pub mod accounts;
pub mod error;
pub mod logging;
pub mod reconcile;
pub mod regions;
pub mod report;
pub mod source;

pub use accounts::AccountConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use reconcile::{ClaimKeys, PoolMode, ReconcileConfig};
pub use regions::{RegionsConfig, DEFAULT_REGIONS};
pub use report::{ReportConfig, SlackConfig};
pub use source::{ControlPlaneConfig, SourceConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Unified configuration for an audit run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SweepConfig {
    /// Cloud accounts to audit
    pub accounts: Vec<AccountConfig>,
    /// Regions audited in every account
    pub regions: RegionsConfig,
    /// Claim stage settings
    pub reconcile: ReconcileConfig,
    /// Inventory sources
    pub source: SourceConfig,
    /// Report rendering and delivery
    pub report: ReportConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl SweepConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (file values are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("CLOUDSWEEP_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("CLOUDSWEEP_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(mode) = std::env::var("CLOUDSWEEP_POOL_MODE") {
            if let Ok(m) = mode.parse() {
                self.reconcile.pool_mode = m;
            }
        }
        if let Ok(concurrency) = std::env::var("CLOUDSWEEP_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                self.reconcile.concurrency = c;
            }
        }

        if let Ok(regions) = std::env::var("CLOUDSWEEP_REGIONS") {
            let regions = split_list(&regions);
            if !regions.is_empty() {
                self.regions.enabled = regions;
            }
        }
        if let Ok(dir) = std::env::var("CLOUDSWEEP_SNAPSHOT_DIR") {
            if !dir.is_empty() {
                self.source.snapshot_dir = Some(PathBuf::from(dir));
            }
        }

        // Role ARNs append to the configured accounts
        if let Ok(arns) = std::env::var("CLOUDSWEEP_ROLE_ARNS") {
            for arn in split_list(&arns) {
                self.accounts.push(AccountConfig::from_role_arn(arn));
            }
        }

        self
    }

    /// Account IDs in configured order, duplicates removed.
    pub fn account_ids(&self) -> Result<Vec<String>, ConfigError> {
        let mut ids: Vec<String> = Vec::with_capacity(self.accounts.len());
        for account in &self.accounts {
            let id = account.account_id()?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconcile.concurrency == 0 {
            return Err(ConfigError::Validation {
                field: "reconcile.concurrency".to_string(),
                message: "concurrency must be non-zero".to_string(),
            });
        }

        self.regions.validate()?;
        self.report.validate()?;
        self.account_ids()?;

        if let Some(control_plane) = &self.source.control_plane {
            if control_plane.base_url.is_empty() {
                return Err(ConfigError::Validation {
                    field: "source.control_plane.base_url".to_string(),
                    message: "URL cannot be empty".to_string(),
                });
            }
            if control_plane.per_page == 0 {
                return Err(ConfigError::Validation {
                    field: "source.control_plane.per_page".to_string(),
                    message: "page size must be non-zero".to_string(),
                });
            }
        }

        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
