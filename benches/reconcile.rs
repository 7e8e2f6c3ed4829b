//! Benchmarks for the claim pipeline with varying region sizes.
//!
//! Each region holds `n` managed DB clusters, each with three tagged nodes
//! carrying one volume, one managed cluster per DB cluster, and a tail of
//! orphaned instances and volumes.

use chrono::Utc;
use cloudsweep::config::ClaimKeys;
use cloudsweep::inventory::snapshot::{
    BlockDeviceRecord, InstanceRecord, ManagedClusterRecord, ManagedDbAccountRecord,
    ManagedDbClusterRecord, StackRecord, VolumeRecord,
};
use cloudsweep::inventory::{ManagedDbPool, ManagedDbSnapshot, RegionKey, RegionSnapshot};
use cloudsweep::reconcile::{ClaimPipeline, SharedDbPool};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::collections::BTreeMap;

fn volume(id: String) -> VolumeRecord {
    VolumeRecord {
        id,
        size_gib: 100,
        volume_type: Some("gp3".to_string()),
        state: "in-use".to_string(),
        tags: BTreeMap::new(),
        created_at: None,
    }
}

fn instance(id: String, subnet: String, tags: BTreeMap<String, String>, volume: String) -> InstanceRecord {
    InstanceRecord {
        id,
        subnet_id: subnet,
        instance_type: "m5.xlarge".to_string(),
        key_name: None,
        platform: None,
        tags,
        block_device_mappings: vec![BlockDeviceRecord {
            device_name: None,
            volume_id: volume,
        }],
        created_at: None,
    }
}

fn region_snapshot(clusters: usize) -> RegionSnapshot {
    let mut snapshot = RegionSnapshot::default();

    for c in 0..clusters {
        let subnet = format!("subnet-{}", c);
        for n in 0..3 {
            let id = format!("i-{}-{}", c, n);
            let vol = format!("vol-{}-{}", c, n);
            let tags = BTreeMap::from([
                ("DatabaseID".to_string(), format!("db-{}", c)),
                ("cluster".to_string(), format!("eks-{}", c)),
            ]);
            snapshot.instances.push(instance(id, subnet.clone(), tags, vol.clone()));
            snapshot.volumes.push(volume(vol));
        }
        snapshot.managed_clusters.push(ManagedClusterRecord {
            name: format!("eks-{}", c),
            network_id: "vpc-1".to_string(),
            subnet_ids: vec![subnet],
            tags: BTreeMap::from([("CloudID".to_string(), format!("cloud-{}", c % 8))]),
            created_at: None,
        });
    }

    for s in 0..clusters / 4 {
        snapshot.stack_deployments.push(StackRecord {
            id: format!("stack-{}", s),
            name: format!("stack-{}", s),
            parameters: BTreeMap::from([("CloudID".to_string(), format!("cloud-{}", s % 8))]),
            declared_resources: Vec::new(),
            created_at: None,
        });
    }

    for o in 0..clusters {
        snapshot.instances.push(instance(
            format!("i-orphan-{}", o),
            "subnet-unowned".to_string(),
            BTreeMap::new(),
            format!("vol-orphan-{}", o),
        ));
        snapshot.volumes.push(volume(format!("vol-stray-{}", o)));
    }

    snapshot
}

fn managed_db(clusters: usize) -> ManagedDbPool {
    ManagedDbSnapshot {
        accounts: (0..8)
            .map(|a| ManagedDbAccountRecord {
                id: format!("cloud-{}", a),
                name: format!("cloud-{}", a),
                provider: "aws".to_string(),
                status: "healthy".to_string(),
                region: None,
                network_cidr: "10.0.0.0/16".to_string(),
                network_id: "vpc-1".to_string(),
            })
            .collect(),
        clusters: (0..clusters)
            .map(|c| ManagedDbClusterRecord {
                id: format!("db-{}", c),
                name: format!("db-{}", c),
                node_count: 3,
                services: vec!["data".to_string()],
                environment: None,
            })
            .collect(),
    }
    .into_pool()
}

/// Benchmark one regional reconciliation as the region grows.
fn bench_region_scoped_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("region_scoped_reconcile");
    let pipeline = ClaimPipeline::standard(&ClaimKeys::default());
    let key = RegionKey::new("111122223333", "us-east-1");
    let now = Utc::now();

    for clusters in [10, 100, 1000] {
        let snapshot = region_snapshot(clusters);
        let db = managed_db(clusters);

        group.bench_with_input(BenchmarkId::from_parameter(clusters), &clusters, |b, _| {
            b.iter_batched(
                || (snapshot.clone().into_pool(key.clone(), now), db.clone()),
                |(pool, db)| black_box(pipeline.reconcile(pool, db)),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark shared mode across several regions.
fn bench_shared_across_regions(c: &mut Criterion) {
    let pipeline = ClaimPipeline::standard(&ClaimKeys::default());
    let snapshot = region_snapshot(100);
    let db = managed_db(100);
    let now = Utc::now();
    let regions = ["us-east-1", "us-west-2", "eu-west-1", "ap-south-1"];

    c.bench_function("shared_reconcile_4_regions", |b| {
        b.iter_batched(
            || {
                let pools: Vec<_> = regions
                    .iter()
                    .map(|r| snapshot.clone().into_pool(RegionKey::new("111122223333", *r), now))
                    .collect();
                (pools, db.clone())
            },
            |(pools, db)| {
                let mut shared = SharedDbPool::new(db);
                let contexts: Vec<_> = pools
                    .into_iter()
                    .map(|pool| shared.reconcile(&pipeline, pool))
                    .collect();
                black_box((contexts, shared.into_remaining()))
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark snapshot-to-pool conversion on its own.
fn bench_snapshot_into_pool(c: &mut Criterion) {
    let snapshot = region_snapshot(1000);
    let key = RegionKey::new("111122223333", "us-east-1");
    let now = Utc::now();

    c.bench_function("snapshot_into_pool_1000", |b| {
        b.iter_batched(
            || snapshot.clone(),
            |s| black_box(s.into_pool(key.clone(), now)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_region_scoped_by_size,
    bench_shared_across_regions,
    bench_snapshot_into_pool
);
criterion_main!(benches);
