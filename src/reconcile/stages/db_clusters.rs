use crate::config::ClaimKeys;
use crate::inventory::{ResourceKind, ResourcePool};
use crate::reconcile::index;
use crate::reconcile::{ClaimStage, Stage, StageOutcome};

/// Stage 2: managed DB clusters claim the instances tagged with their ID.
///
/// A claimed instance carrying the cluster-name tag also tells the DB
/// cluster which managed cluster it runs in. When members disagree, the
/// instance with the greatest ID wins.
pub struct DbClusterInstances {
    keys: ClaimKeys,
}

impl DbClusterInstances {
    pub fn new(keys: ClaimKeys) -> Self {
        Self { keys }
    }
}

impl ClaimStage for DbClusterInstances {
    fn stage(&self) -> Stage {
        Stage::DbClusterInstances
    }

    fn claim(&self, pool: &mut ResourcePool) -> StageOutcome {
        let outcome = StageOutcome::begin(self.stage(), pool, &[ResourceKind::Instance]);
        let by_cluster = index::instances_by_cluster_tag(pool, &self.keys);
        let ResourcePool {
            instances,
            db_clusters,
            ..
        } = &mut *pool;

        for (cluster_id, cluster) in db_clusters.iter_mut() {
            let Some(members) = by_cluster.get(cluster_id) else {
                continue;
            };
            for instance_id in members {
                let Some(instance) = instances.remove(instance_id) else {
                    continue;
                };
                if let Some(name) = instance.resource.tag(&self.keys.cluster_name_tag) {
                    cluster.linked_cluster_name = Some(name.to_string());
                }
                cluster.claim_instance(instance);
            }
        }

        outcome.finish(pool)
    }
}
