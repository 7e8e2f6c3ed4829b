//! Frozen reconciliation results
//!
//! A [`RegionalContext`] is a drained pool that can no longer be mutated. The
//! [`GlobalContext`] collects every regional context of a run together with
//! the managed-database entries no region attributed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use super::StageOutcome;
use crate::inventory::{
    Census, Instance, ManagedCluster, ManagedDbAccount, ManagedDbCluster, ManagedDbPool,
    RegionKey, Resource, ResourceKind, ResourcePool, StackDeployment, Volume,
};

/// Read-only result of running the claim stages on one regional pool.
#[derive(Debug, Clone)]
pub struct RegionalContext {
    pool: ResourcePool,
    outcomes: Vec<StageOutcome>,
}

impl RegionalContext {
    pub fn freeze(pool: ResourcePool, outcomes: Vec<StageOutcome>) -> Self {
        Self { pool, outcomes }
    }

    pub fn key(&self) -> &RegionKey {
        self.pool.key()
    }

    pub fn outcomes(&self) -> &[StageOutcome] {
        &self.outcomes
    }

    pub fn volumes(&self) -> &BTreeMap<String, Volume> {
        self.pool.volumes()
    }

    pub fn instances(&self) -> &BTreeMap<String, Instance> {
        self.pool.instances()
    }

    pub fn db_clusters(&self) -> &BTreeMap<String, ManagedDbCluster> {
        self.pool.db_clusters()
    }

    pub fn managed_clusters(&self) -> &BTreeMap<String, ManagedCluster> {
        self.pool.managed_clusters()
    }

    pub fn stacks(&self) -> &BTreeMap<String, StackDeployment> {
        self.pool.stacks()
    }

    pub fn db_accounts(&self) -> &BTreeMap<String, ManagedDbAccount> {
        self.pool.db_accounts()
    }

    /// Owners left at the top level: attributed managed-database entries,
    /// managed clusters and stacks.
    pub fn roots(&self) -> impl Iterator<Item = Resource<'_>> {
        self.db_accounts()
            .values()
            .filter(|a| a.seen)
            .map(Resource::ManagedDbAccount)
            .chain(
                self.db_clusters()
                    .values()
                    .filter(|c| c.seen)
                    .map(Resource::ManagedDbCluster),
            )
            .chain(self.stacks().values().map(Resource::StackDeployment))
            .chain(self.managed_clusters().values().map(Resource::ManagedCluster))
    }

    /// Volumes and instances nothing claimed.
    pub fn orphans(&self) -> impl Iterator<Item = Resource<'_>> {
        self.instances()
            .values()
            .map(Resource::Instance)
            .chain(self.volumes().values().map(Resource::Volume))
    }

    /// Managed-database entries that claimed nothing in this region.
    pub fn idle_managed_db(&self) -> impl Iterator<Item = Resource<'_>> {
        self.db_accounts()
            .values()
            .filter(|a| !a.seen)
            .map(Resource::ManagedDbAccount)
            .chain(
                self.db_clusters()
                    .values()
                    .filter(|c| !c.seen)
                    .map(Resource::ManagedDbCluster),
            )
    }

    /// Every resource held by this context, claimed children included.
    pub fn census(&self) -> Census {
        self.pool.census()
    }

    /// Number of top-level entries of one kind.
    pub fn len(&self, kind: ResourceKind) -> usize {
        self.pool.len(kind)
    }
}

/// Per-kind totals over a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    pub kind: ResourceKind,
    /// Left at the top level (roots, orphans and idle entries)
    pub top_level: usize,
    /// Owned by another resource
    pub claimed: usize,
}

/// Totals over a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub regions: usize,
    pub kinds: Vec<KindSummary>,
}

impl Summary {
    pub fn kind(&self, kind: ResourceKind) -> Option<&KindSummary> {
        self.kinds.iter().find(|k| k.kind == kind)
    }
}

/// All regional contexts of one run.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    run_id: Uuid,
    generated_at: DateTime<Utc>,
    regions: BTreeMap<RegionKey, RegionalContext>,
    unattributed: ManagedDbPool,
}

impl GlobalContext {
    pub fn new(run_id: Uuid, generated_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            generated_at,
            regions: BTreeMap::new(),
            unattributed: ManagedDbPool::default(),
        }
    }

    pub fn insert(&mut self, context: RegionalContext) {
        self.regions.insert(context.key().clone(), context);
    }

    pub fn set_unattributed(&mut self, pool: ManagedDbPool) {
        self.unattributed = pool;
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn region(&self, key: &RegionKey) -> Option<&RegionalContext> {
        self.regions.get(key)
    }

    /// Regional contexts in (account, region) order.
    pub fn regions(&self) -> impl Iterator<Item = &RegionalContext> {
        self.regions.values()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Managed-database entries returned to the shared pool after the last
    /// region. Always empty in region-scoped mode.
    pub fn unattributed(&self) -> &ManagedDbPool {
        &self.unattributed
    }

    /// Managed-database entries that no region attributed, listed once.
    ///
    /// In region-scoped mode every region holds its own copy of each entry,
    /// so an entry is idle only if it was idle in every region.
    pub fn idle_managed_db(&self) -> ManagedDbPool {
        let mut attributed: BTreeSet<(ResourceKind, String)> = BTreeSet::new();
        for context in self.regions() {
            for root in context.roots() {
                root.walk(&mut |r| {
                    if matches!(
                        r.kind(),
                        ResourceKind::ManagedDbAccount | ResourceKind::ManagedDbCluster
                    ) {
                        attributed.insert((r.kind(), r.id().to_string()));
                    }
                });
            }
        }

        let mut idle = ManagedDbPool::default();
        let candidates = self
            .regions()
            .flat_map(|c| c.idle_managed_db())
            .chain(self.unattributed.accounts.values().map(Resource::ManagedDbAccount))
            .chain(self.unattributed.clusters.values().map(Resource::ManagedDbCluster));
        for entry in candidates {
            if attributed.contains(&(entry.kind(), entry.id().to_string())) {
                continue;
            }
            match entry {
                Resource::ManagedDbAccount(a) => {
                    idle.accounts
                        .entry(a.resource.id.clone())
                        .or_insert_with(|| a.clone());
                }
                Resource::ManagedDbCluster(c) => {
                    idle.clusters
                        .entry(c.resource.id.clone())
                        .or_insert_with(|| c.clone());
                }
                _ => {}
            }
        }
        idle
    }

    /// Per-kind top-level and claimed counts over every region.
    pub fn summary(&self) -> Summary {
        let mut top_level: BTreeMap<ResourceKind, usize> = BTreeMap::new();
        let mut claimed: BTreeMap<ResourceKind, usize> = BTreeMap::new();

        // Managed-db roots attributed in several regions count once
        let mut attributed: BTreeSet<(ResourceKind, &str)> = BTreeSet::new();

        for context in self.regions() {
            for root in context.roots().chain(context.orphans()) {
                let kind = root.kind();
                let shared = matches!(
                    kind,
                    ResourceKind::ManagedDbAccount | ResourceKind::ManagedDbCluster
                );
                if !shared || attributed.insert((kind, root.id())) {
                    *top_level.entry(kind).or_default() += 1;
                }
                for child in root.children() {
                    child.walk(&mut |r| *claimed.entry(r.kind()).or_default() += 1);
                }
            }
        }

        let idle = self.idle_managed_db();
        *top_level.entry(ResourceKind::ManagedDbAccount).or_default() += idle.accounts.len();
        *top_level.entry(ResourceKind::ManagedDbCluster).or_default() += idle.clusters.len();

        Summary {
            run_id: self.run_id,
            generated_at: self.generated_at,
            regions: self.regions.len(),
            kinds: ResourceKind::ALL
                .iter()
                .rev()
                .map(|&kind| KindSummary {
                    kind,
                    top_level: top_level.get(&kind).copied().unwrap_or(0),
                    claimed: claimed.get(&kind).copied().unwrap_or(0),
                })
                .collect(),
        }
    }
}
