//! Shared test utilities for cloudsweep integration tests.
//!
//! Resource builders with sensible defaults, and helpers that lay out a
//! snapshot directory on disk.

#![allow(dead_code)]

use cloudsweep::inventory::{
    BlockDeviceMapping, CloudResource, DeclaredResource, Instance, ManagedCluster,
    ManagedDbAccount, ManagedDbCluster, ManagedDbPool, RegionKey, ResourcePool, StackDeployment,
    Volume,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

// =============================================================================
// Well-Known Test Constants
// =============================================================================

pub const ACCOUNT: &str = "111122223333";
pub const REGION: &str = "us-east-1";
pub const INSTANCE_TYPE: &str = "AWS::EC2::Instance";

// =============================================================================
// Resource Builders
// =============================================================================

fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn base(id: &str, pairs: &[(&str, &str)]) -> CloudResource {
    CloudResource::new(id, ACCOUNT, REGION, tags(pairs), None)
}

pub fn pool() -> ResourcePool {
    ResourcePool::new(RegionKey::new(ACCOUNT, REGION))
}

pub fn make_volume(id: &str) -> Volume {
    Volume {
        resource: base(id, &[]),
        size_gib: 50,
        volume_type: Some("gp3".to_string()),
        state: "available".to_string(),
    }
}

/// Instance in `subnet` with the given tags, mapping the given volumes.
pub fn make_instance(id: &str, subnet: &str, pairs: &[(&str, &str)], volumes: &[&str]) -> Instance {
    Instance {
        resource: base(id, pairs),
        subnet_id: subnet.to_string(),
        instance_type: "m5.large".to_string(),
        key_name: None,
        platform: None,
        block_device_mappings: volumes
            .iter()
            .map(|v| BlockDeviceMapping {
                device_name: Some("/dev/xvda".to_string()),
                volume_id: v.to_string(),
            })
            .collect(),
        volumes: BTreeMap::new(),
    }
}

pub fn make_db_cluster(id: &str) -> ManagedDbCluster {
    ManagedDbCluster {
        resource: CloudResource::new(id, "", "", BTreeMap::new(), None).with_name(id),
        node_count: 3,
        services: vec!["data".to_string(), "index".to_string()],
        environment: Some("sandbox".to_string()),
        linked_cluster_name: None,
        instances: BTreeMap::new(),
        seen: false,
    }
}

pub fn make_db_account(id: &str) -> ManagedDbAccount {
    ManagedDbAccount {
        resource: CloudResource::new(id, "", REGION, BTreeMap::new(), None).with_name(id),
        provider: "aws".to_string(),
        status: "healthy".to_string(),
        network_cidr: "10.0.0.0/16".to_string(),
        network_id: "vpc-1".to_string(),
        managed_clusters: BTreeMap::new(),
        stack: None,
        seen: false,
    }
}

pub fn make_managed_cluster(name: &str, subnets: &[&str], pairs: &[(&str, &str)]) -> ManagedCluster {
    ManagedCluster {
        resource: base(name, pairs).with_name(name),
        network_id: "vpc-1".to_string(),
        subnet_ids: subnets.iter().map(|s| s.to_string()).collect(),
        age: None,
        instances: BTreeMap::new(),
        db_clusters: BTreeMap::new(),
    }
}

/// Stack with the given parameters, declaring the given instance IDs.
pub fn make_stack(id: &str, params: &[(&str, &str)], declared: &[&str]) -> StackDeployment {
    StackDeployment {
        resource: base(id, &[]).with_name(id),
        parameters: tags(params),
        declared_resources: declared
            .iter()
            .map(|physical_id| DeclaredResource {
                physical_id: physical_id.to_string(),
                resource_type: INSTANCE_TYPE.to_string(),
            })
            .collect(),
        age: None,
        instances: BTreeMap::new(),
    }
}

pub fn managed_db(accounts: &[&str], clusters: &[&str]) -> ManagedDbPool {
    let mut db = ManagedDbPool::default();
    for id in accounts {
        db.accounts.insert(id.to_string(), make_db_account(id));
    }
    for id in clusters {
        db.clusters.insert(id.to_string(), make_db_cluster(id));
    }
    db
}

// =============================================================================
// Snapshot Directory Helpers
// =============================================================================

/// Write `<root>/<account>/<region>.json`.
pub fn write_region(root: &Path, account: &str, region: &str, snapshot: &Value) {
    let dir = root.join(account);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join(format!("{}.json", region)),
        serde_json::to_string_pretty(snapshot).unwrap(),
    )
    .unwrap();
}

/// Write `<root>/managed-db.json`.
pub fn write_managed_db(root: &Path, snapshot: &Value) {
    std::fs::write(
        root.join("managed-db.json"),
        serde_json::to_string_pretty(snapshot).unwrap(),
    )
    .unwrap();
}

/// One region with a fully owned chain (db1 ← i1 ← v1, eks1 ← db1,
/// c1 ← eks1), a stack owning i2, and an orphaned instance and volume.
pub fn owned_region_snapshot() -> Value {
    serde_json::json!({
        "volumes": [
            { "id": "v1", "sizeGiB": 100, "type": "gp3", "state": "in-use" },
            { "id": "v-orphan", "sizeGiB": 8, "state": "available",
              "createdAt": "2024-01-01T00:00:00Z" }
        ],
        "instances": [
            { "id": "i1", "subnetId": "sub1", "instanceType": "m5.xlarge",
              "tags": { "DatabaseID": "db1", "cluster": "eks1" },
              "blockDeviceMappings": [ { "deviceName": "/dev/xvda", "volumeId": "v1" } ] },
            { "id": "i2", "subnetId": "sub9", "instanceType": "t3.micro" },
            { "id": "i-orphan", "subnetId": "sub7", "instanceType": "t3.micro",
              "tags": { "Name": "forgotten" } }
        ],
        "managedClusters": [
            { "name": "eks1", "networkId": "vpc-1", "subnetIds": ["sub1"],
              "tags": { "CloudID": "c1" } }
        ],
        "stackDeployments": [
            { "id": "stack-a", "name": "bastion",
              "declaredResources": [ { "physicalId": "i2", "type": "AWS::EC2::Instance" } ] }
        ]
    })
}

pub fn managed_db_snapshot() -> Value {
    serde_json::json!({
        "accounts": [
            { "id": "c1", "name": "team-cloud", "provider": "aws", "status": "healthy",
              "networkCidr": "10.0.0.0/16", "networkId": "vpc-1" },
            { "id": "c-idle", "name": "idle-cloud", "provider": "aws", "status": "healthy" }
        ],
        "clusters": [
            { "id": "db1", "name": "orders", "nodeCount": 3, "services": ["data"] },
            { "id": "db-idle", "name": "stale", "nodeCount": 1 }
        ]
    })
}
