//! cloudsweep - cloud inventory ownership reconciler
//!
//! This library correlates flat per-region cloud inventories (volumes,
//! instances, managed clusters, stack deployments) with the accounts and
//! clusters of a managed-database control plane, builds an ownership forest,
//! and reports the resources nothing owns.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod inventory;
pub mod logging;
pub mod reconcile;
pub mod report;
pub mod source;
