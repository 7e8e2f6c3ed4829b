//! Index builders
//!
//! Pure lookups over the unclaimed part of a pool. Each index maps a join
//! key to the IDs of matching resources in ascending ID order. Holding IDs
//! rather than references lets a stage keep the index while it drains the
//! pool; an index is rebuilt at the start of every stage that needs it.

use std::collections::BTreeMap;

use crate::config::ClaimKeys;
use crate::inventory::ResourcePool;

/// Join key to resource IDs
pub type Index = BTreeMap<String, Vec<String>>;

fn build<'a, T: 'a>(
    entries: impl Iterator<Item = (&'a String, &'a T)>,
    key_of: impl Fn(&'a T) -> Option<&'a str>,
) -> Index {
    let mut index = Index::new();
    for (id, entry) in entries {
        if let Some(key) = key_of(entry) {
            index.entry(key.to_string()).or_default().push(id.clone());
        }
    }
    index
}

/// Instances keyed by the managed DB cluster ID tag. Untagged instances are skipped.
pub fn instances_by_cluster_tag(pool: &ResourcePool, keys: &ClaimKeys) -> Index {
    build(pool.instances().iter(), |i| {
        i.resource.tag(&keys.cluster_id_tag)
    })
}

/// Instances keyed by subnet. Every instance is indexed.
pub fn instances_by_subnet(pool: &ResourcePool) -> Index {
    build(pool.instances().iter(), |i| Some(i.subnet_id.as_str()))
}

/// Managed DB clusters keyed by the managed cluster name learned in stage 2.
pub fn db_clusters_by_linked_name(pool: &ResourcePool) -> Index {
    build(pool.db_clusters().iter(), |c| {
        c.linked_cluster_name.as_deref().filter(|name| !name.is_empty())
    })
}

/// Managed clusters keyed by the account ID tag.
pub fn managed_clusters_by_account_id(pool: &ResourcePool, keys: &ClaimKeys) -> Index {
    build(pool.managed_clusters().iter(), |c| {
        c.resource.tag(&keys.account_id_tag)
    })
}

/// Stacks keyed by the account ID parameter.
pub fn stacks_by_account_id(pool: &ResourcePool, keys: &ClaimKeys) -> Index {
    build(pool.stacks().iter(), |s| s.parameter(&keys.account_id_parameter))
}
