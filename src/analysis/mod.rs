//! Analysis driver
//!
//! Ties sources, pools and the claim pipeline together for a whole run:
//! fetch the managed-database entities once, then fetch and reconcile every
//! (account, region) target according to the configured [`PoolMode`].

pub mod error;

pub use error::AnalysisError;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::SweepConfig;
use crate::inventory::{ManagedDbPool, RegionKey, ResourceKind, ResourcePool};
use crate::reconcile::{ClaimPipeline, GlobalContext, PoolMode, RegionalContext, SharedDbPool};
use crate::source::{InventorySource, ManagedDbSource};

pub struct Analyzer {
    config: SweepConfig,
    inventory: Arc<dyn InventorySource>,
    managed_db: Arc<dyn ManagedDbSource>,
}

impl Analyzer {
    pub fn new(
        config: SweepConfig,
        inventory: Arc<dyn InventorySource>,
        managed_db: Arc<dyn ManagedDbSource>,
    ) -> Self {
        Self {
            config,
            inventory,
            managed_db,
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Every (account, region) pair to audit, accounts outermost.
    pub fn targets(&self) -> Result<Vec<RegionKey>, AnalysisError> {
        let regions = self.config.regions.active()?;
        let accounts = self.config.account_ids()?;
        Ok(accounts
            .iter()
            .flat_map(|account| regions.iter().map(move |region| RegionKey::new(account, region)))
            .collect())
    }

    /// Run the full analysis. The first source error aborts the run.
    pub async fn analyse(&self) -> Result<GlobalContext, AnalysisError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let targets = self.targets()?;
        let mode = self.config.reconcile.pool_mode;

        tracing::info!(
            run_id = %run_id,
            targets = targets.len(),
            pool_mode = ?mode,
            inventory_source = self.inventory.name(),
            managed_db_source = self.managed_db.name(),
            "Analysis started"
        );
        if targets.is_empty() {
            tracing::warn!(run_id = %run_id, "No accounts configured, nothing to audit");
        }

        let managed_db = self
            .managed_db
            .fetch_managed_db()
            .await
            .map_err(AnalysisError::ManagedDb)?
            .into_pool();
        tracing::info!(
            run_id = %run_id,
            accounts = managed_db.accounts.len(),
            clusters = managed_db.clusters.len(),
            "Fetched managed DB entities"
        );

        let pipeline = ClaimPipeline::standard(&self.config.reconcile.keys);
        let mut global = GlobalContext::new(run_id, started_at);

        match mode {
            PoolMode::RegionScoped => {
                for context in self
                    .reconcile_region_scoped(&pipeline, targets, &managed_db, run_id, started_at)
                    .await?
                {
                    global.insert(context);
                }
            }
            PoolMode::Shared => {
                let mut shared = SharedDbPool::new(managed_db);
                for target in targets {
                    let pool = self.fetch_pool(target, started_at).await?;
                    let context = shared.reconcile(&pipeline, pool);
                    log_region(run_id, &context);
                    global.insert(context);
                }
                global.set_unattributed(shared.into_remaining());
            }
        }

        let summary = global.summary();
        for kind in &summary.kinds {
            if matches!(kind.kind, ResourceKind::Volume | ResourceKind::Instance) && kind.top_level > 0 {
                metrics::counter!("cloudsweep_orphans_total", "kind" => kind.kind.as_str())
                    .increment(kind.top_level as u64);
            }
        }
        tracing::info!(
            run_id = %run_id,
            regions = summary.regions,
            elapsed_ms = (Utc::now() - started_at).num_milliseconds(),
            "Analysis completed"
        );

        Ok(global)
    }

    async fn reconcile_region_scoped(
        &self,
        pipeline: &ClaimPipeline,
        targets: Vec<RegionKey>,
        managed_db: &ManagedDbPool,
        run_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<RegionalContext>, AnalysisError> {
        let concurrency = self.config.reconcile.concurrency.max(1);

        stream::iter(targets)
            .map(|target| async move {
                let pool = self.fetch_pool(target, now).await?;
                let context = pipeline.reconcile(pool, managed_db.clone());
                Ok::<_, AnalysisError>(context)
            })
            .buffered(concurrency)
            .inspect_ok(|context| log_region(run_id, context))
            .try_collect()
            .await
    }

    async fn fetch_pool(&self, target: RegionKey, now: DateTime<Utc>) -> Result<ResourcePool, AnalysisError> {
        tracing::info!(account = %target.account, region = %target.region, "Analysing region");

        let snapshot = match self.inventory.fetch_region(&target).await {
            Ok(snapshot) => snapshot,
            Err(source) => return Err(AnalysisError::Region { target, source }),
        };
        tracing::debug!(
            account = %target.account,
            region = %target.region,
            resources = snapshot.len(),
            "Fetched region snapshot"
        );

        Ok(snapshot.into_pool(target, now))
    }
}

fn log_region(run_id: Uuid, context: &RegionalContext) {
    let claimed: usize = context.outcomes().iter().map(|o| o.total_claimed()).sum();
    tracing::debug!(
        run_id = %run_id,
        region = %context.key(),
        claimed,
        orphans = context.orphans().count(),
        "Region reconciled"
    );
}
