//! The five claim stages, one per module

pub mod db_accounts;
pub mod db_clusters;
pub mod managed_clusters;
pub mod stacks;
pub mod volumes;

pub use db_accounts::DbAccountMembers;
pub use db_clusters::DbClusterInstances;
pub use managed_clusters::ManagedClusterMembers;
pub use stacks::StackInstances;
pub use volumes::InstanceVolumes;

use super::ClaimStage;
use crate::config::ClaimKeys;

/// Standard stages in execution order.
pub fn standard(keys: &ClaimKeys) -> Vec<Box<dyn ClaimStage>> {
    vec![
        Box::new(InstanceVolumes),
        Box::new(DbClusterInstances::new(keys.clone())),
        Box::new(ManagedClusterMembers),
        Box::new(StackInstances::new(keys.clone())),
        Box::new(DbAccountMembers::new(keys.clone())),
    ]
}
