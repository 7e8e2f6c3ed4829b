//! Inventory sources
//!
//! A source returns flat, uncorrelated snapshots: one per (account, region)
//! for cloud resources, and one process-wide snapshot for the managed
//! database control plane. Correlating them is the reconciler's job.

pub mod control_plane;
pub mod error;
pub mod snapshot_dir;

pub use control_plane::ControlPlaneClient;
pub use error::SourceError;
pub use snapshot_dir::SnapshotDirSource;

use async_trait::async_trait;

use crate::inventory::{ManagedDbSnapshot, RegionKey, RegionSnapshot};

/// Supplies cloud resources for one (account, region) at a time.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Source identifier for logging
    fn name(&self) -> &'static str;

    async fn fetch_region(&self, target: &RegionKey) -> Result<RegionSnapshot, SourceError>;
}

/// Supplies the managed-database accounts and clusters, once per run.
#[async_trait]
pub trait ManagedDbSource: Send + Sync {
    /// Source identifier for logging
    fn name(&self) -> &'static str;

    async fn fetch_managed_db(&self) -> Result<ManagedDbSnapshot, SourceError>;
}
