//! Flat resource snapshots as produced by inventory sources
//!
//! These records mirror what the cloud and control-plane APIs return: flat,
//! uncorrelated lists. Converting a snapshot into a [`ResourcePool`] is the
//! only way resources enter the reconciler.

use super::pool::{ManagedDbPool, RegionKey, ResourcePool};
use super::resource::{
    BlockDeviceMapping, CloudResource, DeclaredResource, Instance, ManagedCluster,
    ManagedDbAccount, ManagedDbCluster, StackDeployment, Volume,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeRecord {
    pub id: String,
    #[serde(rename = "sizeGiB", default)]
    pub size_gib: u64,
    #[serde(rename = "type", default)]
    pub volume_type: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDeviceRecord {
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(alias = "deviceVolumeId")]
    pub volume_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecord {
    pub id: String,
    #[serde(default)]
    pub subnet_id: String,
    #[serde(default)]
    pub instance_type: String,
    #[serde(default)]
    pub key_name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub block_device_mappings: Vec<BlockDeviceRecord>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterRecord {
    pub name: String,
    #[serde(default)]
    pub network_id: String,
    #[serde(default)]
    pub subnet_ids: Vec<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredResourceRecord {
    pub physical_id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub declared_resources: Vec<DeclaredResourceRecord>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDbClusterRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub node_count: u32,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub environment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDbAccountRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub network_cidr: String,
    #[serde(default)]
    pub network_id: String,
}

/// Everything one (account, region) reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegionSnapshot {
    pub volumes: Vec<VolumeRecord>,
    pub instances: Vec<InstanceRecord>,
    pub managed_clusters: Vec<ManagedClusterRecord>,
    pub stack_deployments: Vec<StackRecord>,
}

impl RegionSnapshot {
    pub fn len(&self) -> usize {
        self.volumes.len()
            + self.instances.len()
            + self.managed_clusters.len()
            + self.stack_deployments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Populate a fresh regional pool. Ages are computed relative to `now`.
    pub fn into_pool(self, key: RegionKey, now: DateTime<Utc>) -> ResourcePool {
        let mut pool = ResourcePool::new(key.clone());
        let RegionKey { account, region } = key;

        for v in self.volumes {
            pool.insert_volume(Volume {
                resource: CloudResource::new(v.id, &account, &region, v.tags, v.created_at),
                size_gib: v.size_gib,
                volume_type: v.volume_type,
                state: v.state,
            });
        }

        for i in self.instances {
            pool.insert_instance(Instance {
                resource: CloudResource::new(i.id, &account, &region, i.tags, i.created_at),
                subnet_id: i.subnet_id,
                instance_type: i.instance_type,
                key_name: i.key_name.filter(|k| !k.is_empty()),
                platform: i.platform.filter(|p| !p.is_empty()),
                block_device_mappings: i
                    .block_device_mappings
                    .into_iter()
                    .map(|m| BlockDeviceMapping {
                        device_name: m.device_name,
                        volume_id: m.volume_id,
                    })
                    .collect(),
                volumes: BTreeMap::new(),
            });
        }

        for c in self.managed_clusters {
            let resource = CloudResource::new(&c.name, &account, &region, c.tags, c.created_at)
                .with_name(c.name);
            pool.insert_managed_cluster(ManagedCluster {
                age: resource.age_at(now),
                resource,
                network_id: c.network_id,
                subnet_ids: c.subnet_ids,
                instances: BTreeMap::new(),
                db_clusters: BTreeMap::new(),
            });
        }

        for s in self.stack_deployments {
            let resource = CloudResource::new(s.id, &account, &region, BTreeMap::new(), s.created_at)
                .with_name(s.name);
            pool.insert_stack(StackDeployment {
                age: resource.age_at(now),
                resource,
                parameters: s.parameters,
                declared_resources: s
                    .declared_resources
                    .into_iter()
                    .map(|d| DeclaredResource {
                        physical_id: d.physical_id,
                        resource_type: d.resource_type,
                    })
                    .collect(),
                instances: BTreeMap::new(),
            });
        }

        pool
    }
}

/// Everything the managed-database control plane reports, process-wide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagedDbSnapshot {
    pub accounts: Vec<ManagedDbAccountRecord>,
    pub clusters: Vec<ManagedDbClusterRecord>,
}

impl ManagedDbSnapshot {
    pub fn into_pool(self) -> ManagedDbPool {
        let mut db = ManagedDbPool::default();

        for a in self.accounts {
            let region = a.region.unwrap_or_default();
            let resource =
                CloudResource::new(&a.id, "", region, BTreeMap::new(), None).with_name(a.name);
            db.accounts.insert(
                a.id,
                ManagedDbAccount {
                    resource,
                    provider: a.provider,
                    status: a.status,
                    network_cidr: a.network_cidr,
                    network_id: a.network_id,
                    managed_clusters: BTreeMap::new(),
                    stack: None,
                    seen: false,
                },
            );
        }

        for c in self.clusters {
            let resource =
                CloudResource::new(&c.id, "", "", BTreeMap::new(), None).with_name(c.name);
            db.clusters.insert(
                c.id,
                ManagedDbCluster {
                    resource,
                    node_count: c.node_count,
                    services: c.services,
                    environment: c.environment,
                    linked_cluster_name: None,
                    instances: BTreeMap::new(),
                    seen: false,
                },
            );
        }

        db
    }
}
