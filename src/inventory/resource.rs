use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::tags::TAG_NAME;

/// The six resource kinds tracked by the reconciler.
///
/// Ordered leaf-first; the report renders sections in the reverse order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Block storage volume
    Volume,
    /// Compute instance
    Instance,
    /// Cluster managed by the database control plane
    ManagedDbCluster,
    /// Managed Kubernetes cluster
    ManagedCluster,
    /// Infrastructure-as-code stack
    StackDeployment,
    /// Database control plane account ("cloud")
    ManagedDbAccount,
}

impl ResourceKind {
    /// All kinds, leaf-first.
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Volume,
        ResourceKind::Instance,
        ResourceKind::ManagedDbCluster,
        ResourceKind::ManagedCluster,
        ResourceKind::StackDeployment,
        ResourceKind::ManagedDbAccount,
    ];

    /// Human-readable plural label used in logs and reports.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Volume => "Volumes",
            ResourceKind::Instance => "Instances",
            ResourceKind::ManagedDbCluster => "Managed DB Clusters",
            ResourceKind::ManagedCluster => "Managed Clusters",
            ResourceKind::StackDeployment => "Stacks",
            ResourceKind::ManagedDbAccount => "Managed DB Accounts",
        }
    }

    /// Stable snake_case identifier, used for metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Volume => "volume",
            ResourceKind::Instance => "instance",
            ResourceKind::ManagedDbCluster => "managed_db_cluster",
            ResourceKind::ManagedCluster => "managed_cluster",
            ResourceKind::StackDeployment => "stack_deployment",
            ResourceKind::ManagedDbAccount => "managed_db_account",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes shared by every resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CloudResource {
    /// Identity, unique within its kind and region
    pub id: String,
    /// Display name (the `Name` tag when present, otherwise the ID)
    pub name: String,
    /// Owning cloud account
    pub account: String,
    /// Region the resource lives in (empty for process-wide entities)
    pub region: String,
    /// Resource tags
    pub tags: BTreeMap<String, String>,
    /// Creation time, when the provider reports one
    pub created_at: Option<DateTime<Utc>>,
}

impl CloudResource {
    /// Build the shared attributes, resolving the display name from tags.
    pub fn new(
        id: impl Into<String>,
        account: impl Into<String>,
        region: impl Into<String>,
        tags: BTreeMap<String, String>,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        let id = id.into();
        let name = tags
            .get(TAG_NAME)
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| id.clone());
        Self {
            id,
            name,
            account: account.into(),
            region: region.into(),
            tags,
            created_at,
        }
    }

    /// Override the display name. Empty names fall back to the ID.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.is_empty() { self.id.clone() } else { name };
        self
    }

    /// Look up a tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Time elapsed since creation, relative to `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.created_at.map(|created| now - created)
    }
}

/// A block storage volume. Always a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub resource: CloudResource,
    pub size_gib: u64,
    pub volume_type: Option<String>,
    pub state: String,
}

/// One block-device mapping on an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDeviceMapping {
    pub device_name: Option<String>,
    pub volume_id: String,
}

/// A compute instance. Owns the volumes attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub resource: CloudResource,
    pub subnet_id: String,
    pub instance_type: String,
    pub key_name: Option<String>,
    pub platform: Option<String>,
    pub block_device_mappings: Vec<BlockDeviceMapping>,
    pub volumes: BTreeMap<String, Volume>,
}

impl Instance {
    pub fn claim_volume(&mut self, volume: Volume) {
        self.volumes.insert(volume.resource.id.clone(), volume);
    }
}

/// A database cluster reported by the managed-database control plane.
///
/// `linked_cluster_name` is only known after its instances have been
/// claimed: it is copied from the instances' cluster-name tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedDbCluster {
    pub resource: CloudResource,
    pub node_count: u32,
    pub services: Vec<String>,
    pub environment: Option<String>,
    pub linked_cluster_name: Option<String>,
    pub instances: BTreeMap<String, Instance>,
    /// Set once this cluster has claimed at least one instance in a run.
    pub seen: bool,
}

impl ManagedDbCluster {
    pub fn claim_instance(&mut self, instance: Instance) {
        self.instances.insert(instance.resource.id.clone(), instance);
        self.seen = true;
    }
}

/// A managed Kubernetes cluster. Keyed by its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedCluster {
    pub resource: CloudResource,
    pub network_id: String,
    pub subnet_ids: Vec<String>,
    #[serde(skip)]
    pub age: Option<Duration>,
    pub instances: BTreeMap<String, Instance>,
    pub db_clusters: BTreeMap<String, ManagedDbCluster>,
}

impl ManagedCluster {
    pub fn claim_instance(&mut self, instance: Instance) {
        self.instances.insert(instance.resource.id.clone(), instance);
    }

    pub fn claim_db_cluster(&mut self, cluster: ManagedDbCluster) {
        self.db_clusters.insert(cluster.resource.id.clone(), cluster);
    }
}

/// A resource declared by a stack template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredResource {
    pub physical_id: String,
    pub resource_type: String,
}

/// An infrastructure-as-code stack deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDeployment {
    pub resource: CloudResource,
    pub parameters: BTreeMap<String, String>,
    pub declared_resources: Vec<DeclaredResource>,
    #[serde(skip)]
    pub age: Option<Duration>,
    pub instances: BTreeMap<String, Instance>,
}

impl StackDeployment {
    pub fn claim_instance(&mut self, instance: Instance) {
        self.instances.insert(instance.resource.id.clone(), instance);
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

/// An account ("cloud") in the managed-database control plane.
///
/// Owns the managed clusters it runs on and at most one stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedDbAccount {
    pub resource: CloudResource,
    pub provider: String,
    pub status: String,
    pub network_cidr: String,
    pub network_id: String,
    pub managed_clusters: BTreeMap<String, ManagedCluster>,
    pub stack: Option<StackDeployment>,
    /// Set once this account has claimed anything in a run.
    pub seen: bool,
}

impl ManagedDbAccount {
    pub fn claim_managed_cluster(&mut self, cluster: ManagedCluster) {
        self.managed_clusters
            .insert(cluster.resource.id.clone(), cluster);
        self.seen = true;
    }

    /// Claim a stack. The slot holds a single stack, so a second claim
    /// replaces the first and hands it back to the caller.
    pub fn claim_stack(&mut self, stack: StackDeployment) -> Option<StackDeployment> {
        self.seen = true;
        self.stack.replace(stack)
    }
}

/// Borrowed view over any resource kind, used to walk the ownership forest.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Volume(&'a Volume),
    Instance(&'a Instance),
    ManagedDbCluster(&'a ManagedDbCluster),
    ManagedCluster(&'a ManagedCluster),
    StackDeployment(&'a StackDeployment),
    ManagedDbAccount(&'a ManagedDbAccount),
}

impl<'a> Resource<'a> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Volume(_) => ResourceKind::Volume,
            Resource::Instance(_) => ResourceKind::Instance,
            Resource::ManagedDbCluster(_) => ResourceKind::ManagedDbCluster,
            Resource::ManagedCluster(_) => ResourceKind::ManagedCluster,
            Resource::StackDeployment(_) => ResourceKind::StackDeployment,
            Resource::ManagedDbAccount(_) => ResourceKind::ManagedDbAccount,
        }
    }

    pub fn base(&self) -> &'a CloudResource {
        match self {
            Resource::Volume(r) => &r.resource,
            Resource::Instance(r) => &r.resource,
            Resource::ManagedDbCluster(r) => &r.resource,
            Resource::ManagedCluster(r) => &r.resource,
            Resource::StackDeployment(r) => &r.resource,
            Resource::ManagedDbAccount(r) => &r.resource,
        }
    }

    pub fn id(&self) -> &'a str {
        &self.base().id
    }

    /// Directly owned children.
    pub fn children(&self) -> Vec<Resource<'a>> {
        match self {
            Resource::Volume(_) => Vec::new(),
            Resource::Instance(i) => i.volumes.values().map(Resource::Volume).collect(),
            Resource::ManagedDbCluster(c) => {
                c.instances.values().map(Resource::Instance).collect()
            }
            Resource::ManagedCluster(c) => c
                .instances
                .values()
                .map(Resource::Instance)
                .chain(c.db_clusters.values().map(Resource::ManagedDbCluster))
                .collect(),
            Resource::StackDeployment(s) => s.instances.values().map(Resource::Instance).collect(),
            Resource::ManagedDbAccount(a) => a
                .managed_clusters
                .values()
                .map(Resource::ManagedCluster)
                .chain(a.stack.iter().map(Resource::StackDeployment))
                .collect(),
        }
    }

    /// Visit this resource and every descendant, depth-first, parents first.
    pub fn walk(&self, visit: &mut impl FnMut(Resource<'a>)) {
        visit(*self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}
