use crate::config::ClaimKeys;
use crate::inventory::{ManagedCluster, ResourceKind, ResourcePool};
use crate::reconcile::index;
use crate::reconcile::{ClaimStage, Stage, StageOutcome};

/// Stage 5: managed DB accounts claim their managed clusters and stack.
///
/// Every managed cluster tagged with the account ID is claimed. An account
/// holds a single stack: when several stacks name the account, only the
/// one with the greatest ID is claimed and the rest stay in the pool.
pub struct DbAccountMembers {
    keys: ClaimKeys,
}

impl DbAccountMembers {
    pub fn new(keys: ClaimKeys) -> Self {
        Self { keys }
    }
}

impl ClaimStage for DbAccountMembers {
    fn stage(&self) -> Stage {
        Stage::DbAccountMembers
    }

    fn claim(&self, pool: &mut ResourcePool) -> StageOutcome {
        let outcome = StageOutcome::begin(
            self.stage(),
            pool,
            &[ResourceKind::ManagedCluster, ResourceKind::StackDeployment],
        );
        let clusters_by_account = index::managed_clusters_by_account_id(pool, &self.keys);
        let stacks_by_account = index::stacks_by_account_id(pool, &self.keys);
        let ResourcePool {
            managed_clusters,
            stacks,
            db_accounts,
            ..
        } = &mut *pool;

        for (account_id, account) in db_accounts.iter_mut() {
            let clusters: Vec<ManagedCluster> = clusters_by_account
                .get(account_id)
                .into_iter()
                .flatten()
                .filter_map(|name| managed_clusters.remove(name))
                .collect();
            for cluster in clusters {
                account.claim_managed_cluster(cluster);
            }

            let stack = stacks_by_account
                .get(account_id)
                .and_then(|ids| ids.last())
                .and_then(|id| stacks.remove(id));
            if let Some(stack) = stack {
                if let Some(previous) = account.claim_stack(stack) {
                    stacks.insert(previous.resource.id.clone(), previous);
                }
            }
        }

        outcome.finish(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::stages::fixtures::*;

    fn stage() -> DbAccountMembers {
        DbAccountMembers::new(ClaimKeys::default())
    }

    #[test]
    fn test_account_claims_tagged_clusters() {
        let mut pool = pool();
        pool.insert_db_account(db_account("c1"));
        pool.insert_managed_cluster(managed_cluster("eks1", &[], &[("CloudID", "c1")]));
        pool.insert_managed_cluster(managed_cluster("eks2", &[], &[("CloudID", "c1")]));
        pool.insert_managed_cluster(managed_cluster("eks3", &[], &[]));

        let outcome = stage().claim(&mut pool);

        let account = &pool.db_accounts()["c1"];
        assert_eq!(account.managed_clusters.len(), 2);
        assert!(account.seen);
        assert!(pool.managed_clusters().contains_key("eks3"));
        assert_eq!(outcome.claimed(ResourceKind::ManagedCluster), 2);
    }

    #[test]
    fn test_account_claims_last_matching_stack_only() {
        let mut pool = pool();
        pool.insert_db_account(db_account("c1"));
        pool.insert_stack(stack("stack-a", &[("CloudID", "c1")], &[]));
        pool.insert_stack(stack("stack-b", &[("CloudID", "c1")], &[]));

        stage().claim(&mut pool);

        let account = &pool.db_accounts()["c1"];
        assert_eq!(account.stack.as_ref().unwrap().resource.id, "stack-b");
        assert!(pool.stacks().contains_key("stack-a"));
        assert_eq!(pool.census().get(ResourceKind::StackDeployment), 2);
    }

    #[test]
    fn test_account_without_matches_stays_unseen() {
        let mut pool = pool();
        pool.insert_db_account(db_account("c1"));
        pool.insert_stack(stack("stack-a", &[("CloudID", "c2")], &[]));

        stage().claim(&mut pool);

        assert!(!pool.db_accounts()["c1"].seen);
        assert!(pool.db_accounts()["c1"].stack.is_none());
        assert_eq!(pool.stacks().len(), 1);
    }
}
