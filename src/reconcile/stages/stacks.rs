use crate::config::ClaimKeys;
use crate::inventory::{Instance, ResourceKind, ResourcePool};
use crate::reconcile::{ClaimStage, Stage, StageOutcome};

/// Stage 4: stacks claim the instances they declare.
///
/// Only declared resources of a configured instance type are considered.
/// Declared IDs that are no longer in the pool are skipped.
pub struct StackInstances {
    keys: ClaimKeys,
}

impl StackInstances {
    pub fn new(keys: ClaimKeys) -> Self {
        Self { keys }
    }
}

impl ClaimStage for StackInstances {
    fn stage(&self) -> Stage {
        Stage::StackInstances
    }

    fn claim(&self, pool: &mut ResourcePool) -> StageOutcome {
        let outcome = StageOutcome::begin(self.stage(), pool, &[ResourceKind::Instance]);
        let ResourcePool {
            instances, stacks, ..
        } = &mut *pool;

        for stack in stacks.values_mut() {
            let declared: Vec<Instance> = stack
                .declared_resources
                .iter()
                .filter(|r| self.keys.is_instance_type(&r.resource_type))
                .filter_map(|r| instances.remove(&r.physical_id))
                .collect();
            for instance in declared {
                stack.claim_instance(instance);
            }
        }

        outcome.finish(pool)
    }
}
