//! Reconciliation configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::inventory::tags::{
    DEFAULT_ACCOUNT_ID_PARAMETER, DEFAULT_ACCOUNT_ID_TAG, DEFAULT_CLUSTER_ID_TAG,
    DEFAULT_CLUSTER_NAME_TAG, DEFAULT_INSTANCE_RESOURCE_TYPE,
};

/// How managed-database entities are shared between regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PoolMode {
    /// Every region reconciles against its own copy of the snapshot
    #[default]
    RegionScoped,
    /// One pool is carried through regions in order; first claim wins
    Shared,
}

impl FromStr for PoolMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "region_scoped" => Ok(PoolMode::RegionScoped),
            "shared" => Ok(PoolMode::Shared),
            _ => Err(format!("Invalid pool mode: {}", s)),
        }
    }
}

/// Tag and parameter keys the claim stages join on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimKeys {
    /// Instance tag naming its managed DB cluster
    pub cluster_id_tag: String,
    /// Instance tag naming its managed cluster
    pub cluster_name_tag: String,
    /// Managed cluster tag naming its managed DB account
    pub account_id_tag: String,
    /// Stack parameter naming its managed DB account
    pub account_id_parameter: String,
    /// Declared stack resource types treated as instances
    pub instance_resource_types: Vec<String>,
}

impl Default for ClaimKeys {
    fn default() -> Self {
        Self {
            cluster_id_tag: DEFAULT_CLUSTER_ID_TAG.to_string(),
            cluster_name_tag: DEFAULT_CLUSTER_NAME_TAG.to_string(),
            account_id_tag: DEFAULT_ACCOUNT_ID_TAG.to_string(),
            account_id_parameter: DEFAULT_ACCOUNT_ID_PARAMETER.to_string(),
            instance_resource_types: vec![DEFAULT_INSTANCE_RESOURCE_TYPE.to_string()],
        }
    }
}

impl ClaimKeys {
    pub fn is_instance_type(&self, resource_type: &str) -> bool {
        self.instance_resource_types
            .iter()
            .any(|t| t == resource_type)
    }
}

/// Reconciliation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub pool_mode: PoolMode,
    /// Regions fetched and reconciled at once (region-scoped mode only)
    pub concurrency: usize,
    pub keys: ClaimKeys,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            pool_mode: PoolMode::RegionScoped,
            concurrency: 4,
            keys: ClaimKeys::default(),
        }
    }
}
