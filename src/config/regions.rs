//! Region selection

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

/// Regions audited when none are configured.
pub const DEFAULT_REGIONS: [&str; 15] = [
    "us-east-1",
    "us-east-2",
    "us-west-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "eu-north-1",
    "ca-central-1",
    "us-west-1",
    "ap-south-1",
    "ap-northeast-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
];

/// Region configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionsConfig {
    /// Regions audited, in processing order
    pub enabled: Vec<String>,
    /// Glob patterns removed from `enabled` (e.g. "ap-*")
    pub exclude: Vec<String>,
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
            exclude: Vec::new(),
        }
    }
}

impl RegionsConfig {
    fn exclude_set(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let glob = Glob::new(pattern).map_err(|e| ConfigError::Validation {
                field: "regions.exclude".to_string(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| ConfigError::Validation {
            field: "regions.exclude".to_string(),
            message: e.to_string(),
        })
    }

    /// Enabled regions not matched by any exclude pattern, order preserved.
    pub fn active(&self) -> Result<Vec<String>, ConfigError> {
        let excluded = self.exclude_set()?;
        Ok(self
            .enabled
            .iter()
            .filter(|region| !excluded.is_match(region.as_str()))
            .cloned()
            .collect())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.active()?.is_empty() {
            return Err(ConfigError::Validation {
                field: "regions.enabled".to_string(),
                message: "no region left to audit".to_string(),
            });
        }
        Ok(())
    }
}
