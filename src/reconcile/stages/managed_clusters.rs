use crate::inventory::{Instance, ManagedDbCluster, ResourceKind, ResourcePool};
use crate::reconcile::index;
use crate::reconcile::{ClaimStage, Stage, StageOutcome};

/// Stage 3: managed clusters claim their DB clusters and their nodes.
///
/// DB clusters are matched on the managed cluster name learned in stage 2.
/// Nodes cannot be listed without cluster credentials, so every instance
/// still unclaimed in one of the cluster's subnets is taken. Instances of
/// unrelated workloads sharing those subnets are over-claimed.
pub struct ManagedClusterMembers;

impl ClaimStage for ManagedClusterMembers {
    fn stage(&self) -> Stage {
        Stage::ManagedClusterMembers
    }

    fn claim(&self, pool: &mut ResourcePool) -> StageOutcome {
        let outcome = StageOutcome::begin(
            self.stage(),
            pool,
            &[ResourceKind::ManagedDbCluster, ResourceKind::Instance],
        );
        let by_name = index::db_clusters_by_linked_name(pool);
        let by_subnet = index::instances_by_subnet(pool);
        let ResourcePool {
            instances,
            db_clusters,
            managed_clusters,
            ..
        } = &mut *pool;

        for (name, cluster) in managed_clusters.iter_mut() {
            let linked: Vec<ManagedDbCluster> = by_name
                .get(name)
                .into_iter()
                .flatten()
                .filter_map(|id| db_clusters.remove(id))
                .collect();
            for db_cluster in linked {
                cluster.claim_db_cluster(db_cluster);
            }

            let nodes: Vec<Instance> = cluster
                .subnet_ids
                .iter()
                .filter_map(|subnet| by_subnet.get(subnet))
                .flatten()
                .filter_map(|id| instances.remove(id))
                .collect();
            for node in nodes {
                cluster.claim_instance(node);
            }
        }

        outcome.finish(pool)
    }
}
