//! Managed-database pool shared across regions
//!
//! Only used in [`PoolMode::Shared`]. Regions are reconciled strictly one
//! after another; before each region the remaining entries are lent to its
//! pool and afterwards the entries that claimed nothing there are handed
//! back. The first region to attribute an entry keeps it.

pub use crate::config::PoolMode;

use super::{ClaimPipeline, RegionalContext};
use crate::inventory::{ManagedDbPool, ResourcePool};

#[derive(Debug, Default)]
pub struct SharedDbPool {
    remaining: ManagedDbPool,
}

impl SharedDbPool {
    pub fn new(snapshot: ManagedDbPool) -> Self {
        Self {
            remaining: snapshot,
        }
    }

    pub fn remaining(&self) -> &ManagedDbPool {
        &self.remaining
    }

    /// Move every remaining entry into a regional pool.
    pub fn lend_to(&mut self, pool: &mut ResourcePool) {
        pool.load_managed_db(std::mem::take(&mut self.remaining));
    }

    /// Take back entries a region did not attribute.
    pub fn restore(&mut self, idle: ManagedDbPool) {
        self.remaining.accounts.extend(idle.accounts);
        self.remaining.clusters.extend(idle.clusters);
    }

    /// Reconcile one region against the shared entries.
    pub fn reconcile(&mut self, pipeline: &ClaimPipeline, mut pool: ResourcePool) -> RegionalContext {
        self.lend_to(&mut pool);
        let outcomes = pipeline.execute(&mut pool);
        let idle = pool.release_idle_managed_db();
        tracing::debug!(
            region = %pool.key(),
            returned = idle.len(),
            "Returned idle managed DB entries to the shared pool"
        );
        self.restore(idle);
        RegionalContext::freeze(pool, outcomes)
    }

    pub fn into_remaining(self) -> ManagedDbPool {
        self.remaining
    }
}
