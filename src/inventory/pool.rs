use super::resource::{
    Instance, ManagedCluster, ManagedDbAccount, ManagedDbCluster, Resource, ResourceKind,
    StackDeployment, Volume,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifies one regional pool: an (account, region) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionKey {
    pub account: String,
    pub region: String,
}

impl RegionKey {
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account, self.region)
    }
}

/// Process-wide managed-database entities, keyed by ID.
///
/// Used both as the fetched snapshot and as the shared pool carried across
/// regions in shared mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedDbPool {
    pub accounts: BTreeMap<String, ManagedDbAccount>,
    pub clusters: BTreeMap<String, ManagedDbCluster>,
}

impl ManagedDbPool {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.clusters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.accounts.len() + self.clusters.len()
    }
}

/// Count of resources per kind, claimed or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Census(BTreeMap<ResourceKind, usize>);

impl Census {
    /// Count every resource reachable from `roots`, descendants included.
    pub fn of<'a>(roots: impl IntoIterator<Item = Resource<'a>>) -> Self {
        let mut counts: BTreeMap<ResourceKind, usize> =
            ResourceKind::ALL.iter().map(|k| (*k, 0)).collect();
        for root in roots {
            root.walk(&mut |r| *counts.entry(r.kind()).or_default() += 1);
        }
        Self(counts)
    }

    pub fn get(&self, kind: ResourceKind) -> usize {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, usize)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// Per-region arena of not-yet-claimed resources, one map per kind.
///
/// Populated once from the inventory sources, then drained only by the claim
/// stages through the `take_*` methods. A resource taken from the pool is
/// moved into exactly one parent, so it can never be claimed twice.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    key: RegionKey,
    pub(crate) volumes: BTreeMap<String, Volume>,
    pub(crate) instances: BTreeMap<String, Instance>,
    pub(crate) db_clusters: BTreeMap<String, ManagedDbCluster>,
    pub(crate) managed_clusters: BTreeMap<String, ManagedCluster>,
    pub(crate) stacks: BTreeMap<String, StackDeployment>,
    pub(crate) db_accounts: BTreeMap<String, ManagedDbAccount>,
}

impl ResourcePool {
    /// Create an empty pool for one region.
    pub fn new(key: RegionKey) -> Self {
        Self {
            key,
            volumes: BTreeMap::new(),
            instances: BTreeMap::new(),
            db_clusters: BTreeMap::new(),
            managed_clusters: BTreeMap::new(),
            stacks: BTreeMap::new(),
            db_accounts: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> &RegionKey {
        &self.key
    }

    pub fn insert_volume(&mut self, volume: Volume) {
        let id = volume.resource.id.clone();
        if self.volumes.insert(id.clone(), volume).is_some() {
            tracing::warn!(region = %self.key, id = %id, "Duplicate volume ID in snapshot, keeping the last one");
        }
    }

    pub fn insert_instance(&mut self, instance: Instance) {
        let id = instance.resource.id.clone();
        if self.instances.insert(id.clone(), instance).is_some() {
            tracing::warn!(region = %self.key, id = %id, "Duplicate instance ID in snapshot, keeping the last one");
        }
    }

    pub fn insert_db_cluster(&mut self, cluster: ManagedDbCluster) {
        self.db_clusters.insert(cluster.resource.id.clone(), cluster);
    }

    pub fn insert_managed_cluster(&mut self, cluster: ManagedCluster) {
        let id = cluster.resource.id.clone();
        if self.managed_clusters.insert(id.clone(), cluster).is_some() {
            tracing::warn!(region = %self.key, id = %id, "Duplicate managed cluster name in snapshot, keeping the last one");
        }
    }

    pub fn insert_stack(&mut self, stack: StackDeployment) {
        let id = stack.resource.id.clone();
        if self.stacks.insert(id.clone(), stack).is_some() {
            tracing::warn!(region = %self.key, id = %id, "Duplicate stack ID in snapshot, keeping the last one");
        }
    }

    pub fn insert_db_account(&mut self, account: ManagedDbAccount) {
        self.db_accounts.insert(account.resource.id.clone(), account);
    }

    /// Move the managed-database entities into this pool.
    pub fn load_managed_db(&mut self, db: ManagedDbPool) {
        self.db_accounts.extend(db.accounts);
        self.db_clusters.extend(db.clusters);
    }

    /// Move out the managed-database entities that never claimed anything
    /// in this region.
    ///
    /// Accounts are attributed by their `seen` flag. Clusters are attributed
    /// if they claimed instances; clusters claimed by a managed cluster have
    /// already left the pool.
    pub fn release_idle_managed_db(&mut self) -> ManagedDbPool {
        let (seen_accounts, idle_accounts): (BTreeMap<_, _>, BTreeMap<_, _>) = std::mem::take(&mut self.db_accounts)
            .into_iter()
            .partition(|(_, a)| a.seen);
        let (seen_clusters, idle_clusters): (BTreeMap<_, _>, BTreeMap<_, _>) = std::mem::take(&mut self.db_clusters)
            .into_iter()
            .partition(|(_, c)| c.seen);
        self.db_accounts = seen_accounts;
        self.db_clusters = seen_clusters;
        ManagedDbPool {
            accounts: idle_accounts,
            clusters: idle_clusters,
        }
    }

    pub fn volumes(&self) -> &BTreeMap<String, Volume> {
        &self.volumes
    }

    pub fn instances(&self) -> &BTreeMap<String, Instance> {
        &self.instances
    }

    pub fn db_clusters(&self) -> &BTreeMap<String, ManagedDbCluster> {
        &self.db_clusters
    }

    pub fn managed_clusters(&self) -> &BTreeMap<String, ManagedCluster> {
        &self.managed_clusters
    }

    pub fn stacks(&self) -> &BTreeMap<String, StackDeployment> {
        &self.stacks
    }

    pub fn db_accounts(&self) -> &BTreeMap<String, ManagedDbAccount> {
        &self.db_accounts
    }

    pub fn take_volume(&mut self, id: &str) -> Option<Volume> {
        self.volumes.remove(id)
    }

    pub fn take_instance(&mut self, id: &str) -> Option<Instance> {
        self.instances.remove(id)
    }

    pub fn take_db_cluster(&mut self, id: &str) -> Option<ManagedDbCluster> {
        self.db_clusters.remove(id)
    }

    pub fn take_managed_cluster(&mut self, id: &str) -> Option<ManagedCluster> {
        self.managed_clusters.remove(id)
    }

    pub fn take_stack(&mut self, id: &str) -> Option<StackDeployment> {
        self.stacks.remove(id)
    }

    /// Number of unclaimed resources of one kind.
    pub fn len(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Volume => self.volumes.len(),
            ResourceKind::Instance => self.instances.len(),
            ResourceKind::ManagedDbCluster => self.db_clusters.len(),
            ResourceKind::ManagedCluster => self.managed_clusters.len(),
            ResourceKind::StackDeployment => self.stacks.len(),
            ResourceKind::ManagedDbAccount => self.db_accounts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ResourceKind::ALL.iter().all(|k| self.len(*k) == 0)
    }

    /// Every pool entry, leaf kinds first. Children are reached through
    /// [`Resource::walk`].
    pub fn entries(&self) -> impl Iterator<Item = Resource<'_>> {
        self.volumes
            .values()
            .map(Resource::Volume)
            .chain(self.instances.values().map(Resource::Instance))
            .chain(self.db_clusters.values().map(Resource::ManagedDbCluster))
            .chain(self.managed_clusters.values().map(Resource::ManagedCluster))
            .chain(self.stacks.values().map(Resource::StackDeployment))
            .chain(self.db_accounts.values().map(Resource::ManagedDbAccount))
    }

    /// Count every resource held by the pool, claimed children included.
    pub fn census(&self) -> Census {
        Census::of(self.entries())
    }
}
