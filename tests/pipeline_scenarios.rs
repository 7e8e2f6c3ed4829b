//! Integration tests for the claim pipeline
//!
//! Runs the standard stages end-to-end on hand-built pools and checks the
//! resulting ownership forest.

mod common;

use cloudsweep::config::ClaimKeys;
use cloudsweep::inventory::{Census, ResourceKind};
use cloudsweep::reconcile::stages::{DbClusterInstances, ManagedClusterMembers};
use cloudsweep::reconcile::{ClaimPipeline, ClaimStage, RegionalContext, Stage};
use common::*;
use std::collections::BTreeSet;

fn reconcile(pool: cloudsweep::inventory::ResourcePool) -> RegionalContext {
    ClaimPipeline::standard(&ClaimKeys::default()).reconcile(pool, Default::default())
}

#[test]
fn test_db_cluster_claims_tagged_instance() {
    let mut pool = pool();
    pool.insert_instance(make_instance("i1", "sub1", &[("DatabaseID", "db1")], &[]));
    pool.insert_db_cluster(make_db_cluster("db1"));

    let context = reconcile(pool);

    let db1 = &context.db_clusters()["db1"];
    assert_eq!(db1.instances.keys().collect::<Vec<_>>(), vec!["i1"]);
    assert!(db1.seen);
    assert!(context.instances().is_empty());
}

#[test]
fn test_instance_claims_mapped_volume() {
    let mut pool = pool();
    pool.insert_instance(make_instance("i1", "sub1", &[], &["v1"]));
    pool.insert_volume(make_volume("v1"));

    let context = reconcile(pool);

    assert!(context.volumes().is_empty());
    let i1 = &context.instances()["i1"];
    assert_eq!(i1.volumes.keys().collect::<Vec<_>>(), vec!["v1"]);
}

#[test]
fn test_managed_cluster_claims_untagged_instance_in_subnet() {
    let mut pool = pool();
    pool.insert_managed_cluster(make_managed_cluster("eks1", &["sub1"], &[]));
    pool.insert_instance(make_instance("i2", "sub1", &[], &[]));

    let context = reconcile(pool);

    assert!(context.instances().is_empty());
    assert!(context.managed_clusters()["eks1"].instances.contains_key("i2"));
}

#[test]
fn test_stack_declaring_missing_instance_claims_nothing() {
    let mut pool = pool();
    pool.insert_stack(make_stack("stack1", &[], &["i3"]));

    let context = reconcile(pool);

    assert!(context.stacks()["stack1"].instances.is_empty());
    assert_eq!(context.outcomes().len(), 5);
}

#[test]
fn test_full_chain_from_volume_to_db_account() {
    let mut pool = pool();
    pool.insert_volume(make_volume("v1"));
    pool.insert_instance(make_instance(
        "i1",
        "sub1",
        &[("DatabaseID", "db1"), ("cluster", "eks1")],
        &["v1"],
    ));
    pool.insert_managed_cluster(make_managed_cluster("eks1", &["sub1"], &[("CloudID", "c1")]));
    pool.insert_stack(make_stack("stack1", &[("CloudID", "c1")], &[]));

    let context = ClaimPipeline::standard(&ClaimKeys::default())
        .reconcile(pool, managed_db(&["c1"], &["db1"]));

    let roots: Vec<_> = context.roots().map(|r| (r.kind(), r.id())).collect();
    assert_eq!(roots, vec![(ResourceKind::ManagedDbAccount, "c1")]);

    let c1 = &context.db_accounts()["c1"];
    let eks1 = &c1.managed_clusters["eks1"];
    let db1 = &eks1.db_clusters["db1"];
    assert_eq!(db1.linked_cluster_name.as_deref(), Some("eks1"));
    assert!(db1.instances["i1"].volumes.contains_key("v1"));
    assert_eq!(
        c1.stack.as_ref().map(|s| s.resource.id.as_str()),
        Some("stack1")
    );
    assert_eq!(context.orphans().count(), 0);
}

#[test]
fn test_census_is_preserved() {
    let mut pool = pool();
    pool.insert_volume(make_volume("v1"));
    pool.insert_volume(make_volume("v2"));
    pool.insert_instance(make_instance("i1", "sub1", &[("DatabaseID", "db1"), ("cluster", "eks1")], &["v1"]));
    pool.insert_instance(make_instance("i2", "sub2", &[], &["v2"]));
    pool.insert_instance(make_instance("i3", "sub3", &[], &[]));
    pool.insert_managed_cluster(make_managed_cluster("eks1", &["sub1", "sub2"], &[("CloudID", "c1")]));
    pool.insert_stack(make_stack("stack1", &[("CloudID", "c1")], &["i3"]));
    pool.insert_stack(make_stack("stack2", &[("CloudID", "c1")], &[]));
    pool.load_managed_db(managed_db(&["c1", "c2"], &["db1", "db2"]));

    let before = pool.census();
    let outcomes = ClaimPipeline::standard(&ClaimKeys::default()).execute(&mut pool);
    let context = RegionalContext::freeze(pool, outcomes);

    assert_eq!(context.census(), before);
    assert_eq!(before.total(), 12);
}

#[test]
fn test_no_resource_is_owned_twice() {
    let mut pool = pool();
    // i1 is both tagged for db1 and inside eks1's subnet; only db1 may own it.
    pool.insert_instance(make_instance("i1", "sub1", &[("DatabaseID", "db1")], &[]));
    pool.insert_managed_cluster(make_managed_cluster("eks1", &["sub1"], &[]));
    pool.insert_stack(make_stack("stack1", &[], &["i1"]));

    let context = ClaimPipeline::standard(&ClaimKeys::default())
        .reconcile(pool, managed_db(&[], &["db1"]));

    let mut seen = BTreeSet::new();
    for root in context.roots().chain(context.orphans()) {
        root.walk(&mut |r| {
            assert!(
                seen.insert((r.kind(), r.id().to_string())),
                "{} {} appears twice",
                r.kind(),
                r.id()
            );
        });
    }
    assert!(context.db_clusters()["db1"].instances.contains_key("i1"));
    assert!(context.managed_clusters()["eks1"].instances.is_empty());
    assert!(context.stacks()["stack1"].instances.is_empty());
}

#[test]
fn test_stage_order_changes_ownership() {
    let build = || {
        let mut pool = pool();
        pool.insert_instance(make_instance(
            "i1",
            "sub1",
            &[("DatabaseID", "db1"), ("cluster", "eks1")],
            &[],
        ));
        pool.insert_managed_cluster(make_managed_cluster("eks1", &["sub1"], &[]));
        pool.load_managed_db(managed_db(&[], &["db1"]));
        pool
    };
    let keys = ClaimKeys::default();

    let mut in_order = build();
    DbClusterInstances::new(keys.clone()).claim(&mut in_order);
    ManagedClusterMembers.claim(&mut in_order);

    let mut reversed = build();
    ManagedClusterMembers.claim(&mut reversed);
    DbClusterInstances::new(keys).claim(&mut reversed);

    let eks1 = &in_order.managed_clusters()["eks1"];
    assert!(eks1.db_clusters["db1"].instances.contains_key("i1"));
    assert!(eks1.instances.is_empty());

    let eks1 = &reversed.managed_clusters()["eks1"];
    assert!(eks1.instances.contains_key("i1"));
    assert!(eks1.db_clusters.is_empty());
    assert!(reversed.db_clusters()["db1"].instances.is_empty());
}

#[test]
fn test_out_of_order_pipeline_is_rejected() {
    let keys = ClaimKeys::default();
    let stages: Vec<Box<dyn ClaimStage>> = vec![
        Box::new(ManagedClusterMembers),
        Box::new(DbClusterInstances::new(keys)),
    ];
    assert!(ClaimPipeline::new(stages).is_err());
}

#[test]
fn test_outcomes_report_claims_per_stage() {
    let mut pool = pool();
    pool.insert_volume(make_volume("v1"));
    pool.insert_instance(make_instance("i1", "sub1", &[], &["v1"]));
    pool.insert_stack(make_stack("stack1", &[], &["i1"]));

    let context = reconcile(pool);

    let stage_claims: Vec<(Stage, usize)> = context
        .outcomes()
        .iter()
        .map(|o| (o.stage, o.total_claimed()))
        .collect();
    assert_eq!(
        stage_claims,
        vec![
            (Stage::InstanceVolumes, 1),
            (Stage::DbClusterInstances, 0),
            (Stage::ManagedClusterMembers, 0),
            (Stage::StackInstances, 1),
            (Stage::DbAccountMembers, 0),
        ]
    );
    assert_eq!(Census::of(context.roots()).total(), 3);
}
