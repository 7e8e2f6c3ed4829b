use crate::inventory::{ResourceKind, ResourcePool, Volume};
use crate::reconcile::{ClaimStage, Stage, StageOutcome};

/// Stage 1: instances claim the volumes named by their block-device mappings.
pub struct InstanceVolumes;

impl ClaimStage for InstanceVolumes {
    fn stage(&self) -> Stage {
        Stage::InstanceVolumes
    }

    fn claim(&self, pool: &mut ResourcePool) -> StageOutcome {
        let outcome = StageOutcome::begin(self.stage(), pool, &[ResourceKind::Volume]);
        let ResourcePool {
            volumes, instances, ..
        } = &mut *pool;

        for instance in instances.values_mut() {
            let attached: Vec<Volume> = instance
                .block_device_mappings
                .iter()
                .filter_map(|m| volumes.remove(&m.volume_id))
                .collect();
            for volume in attached {
                instance.claim_volume(volume);
            }
        }

        outcome.finish(pool)
    }
}
