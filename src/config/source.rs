//! Inventory source configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where inventory snapshots come from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory of JSON snapshots (`<account>/<region>.json`, `managed-db.json`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_dir: Option<PathBuf>,
    /// Managed-database control plane; replaces `managed-db.json` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_plane: Option<ControlPlaneConfig>,
}

/// Managed-database control-plane API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPlaneConfig {
    pub base_url: String,
    /// Names of environment variables holding API keys, one per organisation
    pub api_key_envs: Vec<String>,
    pub per_page: u32,
    pub timeout_seconds: u64,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cloudapi.cloud.couchbase.com".to_string(),
            api_key_envs: vec!["CLOUDSWEEP_CONTROL_PLANE_KEY".to_string()],
            per_page: 100,
            timeout_seconds: 30,
        }
    }
}
