//! Ownership reconciliation
//!
//! A regional [`ResourcePool`] is drained by five claim stages run in a fixed
//! order. Each stage moves resources out of the unclaimed pool into the
//! parent that owns them; whatever is left afterwards is an orphan.
//!
//! Order: InstanceVolumes → DbClusterInstances → ManagedClusterMembers →
//! StackInstances → DbAccountMembers. Later stages depend on links made by
//! earlier ones (stage 3 joins on the cluster name learned in stage 2), so
//! the order is enforced when a pipeline is built.

pub mod context;
pub mod error;
pub mod index;
pub mod shared;
pub mod stages;

pub use context::{GlobalContext, KindSummary, RegionalContext, Summary};
pub use error::PipelineError;
pub use shared::{PoolMode, SharedDbPool};

use serde::Serialize;
use std::fmt;
use std::time::Instant;

use crate::config::ClaimKeys;
use crate::inventory::{ManagedDbPool, ResourceKind, ResourcePool};

/// Position of a stage in the fixed claim order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    InstanceVolumes = 1,
    DbClusterInstances = 2,
    ManagedClusterMembers = 3,
    StackInstances = 4,
    DbAccountMembers = 5,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::InstanceVolumes,
        Stage::DbClusterInstances,
        Stage::ManagedClusterMembers,
        Stage::StackInstances,
        Stage::DbAccountMembers,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::InstanceVolumes => "instance_volumes",
            Stage::DbClusterInstances => "db_cluster_instances",
            Stage::ManagedClusterMembers => "managed_cluster_members",
            Stage::StackInstances => "stack_instances",
            Stage::DbAccountMembers => "db_account_members",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pool size of one kind around a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KindDelta {
    pub kind: ResourceKind,
    pub before: usize,
    pub after: usize,
}

impl KindDelta {
    pub fn claimed(&self) -> usize {
        self.before.saturating_sub(self.after)
    }
}

/// What a stage moved out of the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub deltas: Vec<KindDelta>,
}

impl StageOutcome {
    /// Record the pool size of each drained kind before the stage runs.
    pub fn begin(stage: Stage, pool: &ResourcePool, drains: &[ResourceKind]) -> Self {
        Self {
            stage,
            deltas: drains
                .iter()
                .map(|&kind| KindDelta {
                    kind,
                    before: pool.len(kind),
                    after: pool.len(kind),
                })
                .collect(),
        }
    }

    /// Record the pool size of each drained kind after the stage ran.
    pub fn finish(mut self, pool: &ResourcePool) -> Self {
        for delta in &mut self.deltas {
            delta.after = pool.len(delta.kind);
        }
        self
    }

    pub fn claimed(&self, kind: ResourceKind) -> usize {
        self.deltas
            .iter()
            .filter(|d| d.kind == kind)
            .map(KindDelta::claimed)
            .sum()
    }

    pub fn total_claimed(&self) -> usize {
        self.deltas.iter().map(KindDelta::claimed).sum()
    }
}

/// One ordered pass over a regional pool.
///
/// Stages are synchronous and infallible: a claim whose target is no longer
/// in the pool is skipped.
pub trait ClaimStage: Send + Sync {
    /// Fixed position of this stage in the pipeline
    fn stage(&self) -> Stage;

    /// Stage identifier for logs and metrics
    fn name(&self) -> &'static str {
        self.stage().as_str()
    }

    /// Move owned resources from the pool into their parents.
    fn claim(&self, pool: &mut ResourcePool) -> StageOutcome;
}

/// Executes claim stages in order on a regional pool.
pub struct ClaimPipeline {
    stages: Vec<Box<dyn ClaimStage>>,
}

impl ClaimPipeline {
    /// Build a pipeline, rejecting stage lists that are not strictly ordered.
    pub fn new(stages: Vec<Box<dyn ClaimStage>>) -> Result<Self, PipelineError> {
        for pair in stages.windows(2) {
            let (prev, next) = (pair[0].stage(), pair[1].stage());
            if prev == next {
                return Err(PipelineError::DuplicateStage(next));
            }
            if next < prev {
                return Err(PipelineError::OutOfOrder {
                    stage: next,
                    after: prev,
                });
            }
        }
        Ok(Self { stages })
    }

    /// The five standard stages in their fixed order.
    pub fn standard(keys: &ClaimKeys) -> Self {
        Self {
            stages: stages::standard(keys),
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage once, in order, on the given pool.
    pub fn execute(&self, pool: &mut ResourcePool) -> Vec<StageOutcome> {
        let pipeline_start = Instant::now();
        let key = pool.key().clone();

        tracing::trace!(
            account = %key.account,
            region = %key.region,
            stage_count = self.stages.len(),
            "Claim pipeline started"
        );

        let mut outcomes = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let stage_start = Instant::now();
            let outcome = stage.claim(pool);
            let elapsed = stage_start.elapsed();

            metrics::histogram!(
                "cloudsweep_stage_duration_seconds",
                "stage" => stage.name(),
            )
            .record(elapsed.as_secs_f64());

            for delta in &outcome.deltas {
                if delta.claimed() > 0 {
                    metrics::counter!(
                        "cloudsweep_claims_total",
                        "stage" => stage.name(),
                        "kind" => delta.kind.as_str(),
                    )
                    .increment(delta.claimed() as u64);
                }

                tracing::debug!(
                    account = %key.account,
                    region = %key.region,
                    stage = stage.name(),
                    kind = %delta.kind,
                    before = delta.before,
                    after = delta.after,
                    claimed = delta.claimed(),
                    "Processed claims"
                );
            }

            outcomes.push(outcome);
        }

        tracing::trace!(
            account = %key.account,
            region = %key.region,
            elapsed_us = pipeline_start.elapsed().as_micros() as u64,
            "Claim pipeline completed"
        );

        outcomes
    }

    /// Reconcile one region against its own copy of the managed-database
    /// entries and freeze the result.
    pub fn reconcile(&self, mut pool: ResourcePool, managed_db: ManagedDbPool) -> RegionalContext {
        pool.load_managed_db(managed_db);
        let outcomes = self.execute(&mut pool);
        RegionalContext::freeze(pool, outcomes)
    }
}
