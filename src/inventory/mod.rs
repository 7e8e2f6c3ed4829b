//! Inventory data model
//!
//! Resource kinds, the per-region claimable pool, and the flat snapshots the
//! pool is populated from.

pub mod pool;
pub mod resource;
pub mod snapshot;
pub mod tags;

pub use pool::{Census, ManagedDbPool, RegionKey, ResourcePool};
pub use resource::{
    BlockDeviceMapping, CloudResource, DeclaredResource, Instance, ManagedCluster,
    ManagedDbAccount, ManagedDbCluster, Resource, ResourceKind, StackDeployment, Volume,
};
pub use snapshot::{ManagedDbSnapshot, RegionSnapshot};
