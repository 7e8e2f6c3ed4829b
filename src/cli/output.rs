//! Output formatting helpers for CLI commands

use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use uuid::Uuid;

use crate::inventory::{Resource, ResourceKind};
use crate::reconcile::{GlobalContext, KindSummary, RegionalContext, Summary};
use crate::report::format_age;

/// View model for one reconciled region
#[derive(Debug, Clone, Serialize)]
pub struct RegionView {
    pub account: String,
    pub region: String,
    pub roots: usize,
    pub claimed: usize,
    pub orphaned_instances: usize,
    pub orphaned_volumes: usize,
}

impl From<&RegionalContext> for RegionView {
    fn from(context: &RegionalContext) -> Self {
        Self {
            account: context.key().account.clone(),
            region: context.key().region.clone(),
            roots: context.roots().count(),
            claimed: context.outcomes().iter().map(|o| o.total_claimed()).sum(),
            orphaned_instances: context.instances().len(),
            orphaned_volumes: context.volumes().len(),
        }
    }
}

/// View model for an unowned instance or volume
#[derive(Debug, Clone, Serialize)]
pub struct OrphanView {
    pub kind: ResourceKind,
    pub id: String,
    pub name: String,
    pub account: String,
    pub region: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Resource<'_>> for OrphanView {
    fn from(resource: Resource<'_>) -> Self {
        let base = resource.base();
        Self {
            kind: resource.kind(),
            id: base.id.clone(),
            name: base.name.clone(),
            account: base.account.clone(),
            region: base.region.clone(),
            created_at: base.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct AuditView {
    run_id: Uuid,
    generated_at: DateTime<Utc>,
    summary: Vec<KindSummary>,
    regions: Vec<RegionView>,
    orphans: Vec<OrphanView>,
    idle_managed_db: Vec<String>,
}

fn orphans(global: &GlobalContext) -> Vec<OrphanView> {
    global
        .regions()
        .flat_map(|context| context.orphans())
        .map(OrphanView::from)
        .collect()
}

/// Format per-kind totals as a table
pub fn format_summary_table(summary: &Summary) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Kind", "Top level", "Claimed"]);

    for k in &summary.kinds {
        let top_level = match k.kind {
            ResourceKind::Instance | ResourceKind::Volume if k.top_level > 0 => {
                k.top_level.to_string().red().to_string()
            }
            _ if k.top_level > 0 => k.top_level.to_string().yellow().to_string(),
            _ => k.top_level.to_string().green().to_string(),
        };

        table.add_row(vec![
            Cell::new(k.kind.label()),
            Cell::new(top_level),
            Cell::new(k.claimed),
        ]);
    }

    format!(
        "Run {} ({} regions)\n{}",
        summary.run_id, summary.regions, table
    )
}

/// Format one row per reconciled region
pub fn format_regions_table(global: &GlobalContext) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Account",
        "Region",
        "Roots",
        "Claimed",
        "Orphan instances",
        "Orphan volumes",
    ]);

    for view in global.regions().map(RegionView::from) {
        table.add_row(vec![
            Cell::new(&view.account),
            Cell::new(&view.region),
            Cell::new(view.roots),
            Cell::new(view.claimed),
            Cell::new(orphan_count(view.orphaned_instances)),
            Cell::new(orphan_count(view.orphaned_volumes)),
        ]);
    }

    table.to_string()
}

/// Format every orphaned instance and volume with its age
pub fn format_orphans_table(global: &GlobalContext) -> String {
    let now = global.generated_at();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Kind", "ID", "Name", "Account", "Region", "Age"]);

    for orphan in orphans(global) {
        let age = orphan
            .created_at
            .map(|created| format_age(now - created))
            .unwrap_or_else(|| "unknown".to_string());
        table.add_row(vec![
            Cell::new(orphan.kind.label()),
            Cell::new(&orphan.id),
            Cell::new(&orphan.name),
            Cell::new(&orphan.account),
            Cell::new(&orphan.region),
            Cell::new(age),
        ]);
    }

    table.to_string()
}

/// Format the whole audit as JSON
pub fn format_audit_json(global: &GlobalContext) -> Result<String, serde_json::Error> {
    let summary = global.summary();
    let idle = global.idle_managed_db();
    let view = AuditView {
        run_id: summary.run_id,
        generated_at: summary.generated_at,
        summary: summary.kinds,
        regions: global.regions().map(RegionView::from).collect(),
        orphans: orphans(global),
        idle_managed_db: idle
            .accounts
            .keys()
            .chain(idle.clusters.keys())
            .cloned()
            .collect(),
    };
    serde_json::to_string_pretty(&view)
}

fn orphan_count(n: usize) -> String {
    if n == 0 {
        n.to_string().green().to_string()
    } else {
        n.to_string().red().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClaimKeys;
    use crate::inventory::{ManagedDbPool, RegionKey, ResourcePool};
    use crate::reconcile::stages::fixtures::*;
    use crate::reconcile::ClaimPipeline;

    fn global() -> GlobalContext {
        let mut pool = ResourcePool::new(RegionKey::new(ACCOUNT, REGION));
        pool.insert_instance(instance("i-owned", "sub1", &[("DatabaseID", "db1")], &["v1"]));
        pool.insert_volume(volume("v1"));
        pool.insert_volume(volume("v-orphan"));

        let mut db = ManagedDbPool::default();
        db.clusters.insert("db1".to_string(), db_cluster("db1"));
        db.accounts.insert("c-idle".to_string(), db_account("c-idle"));

        let context = ClaimPipeline::standard(&ClaimKeys::default()).reconcile(pool, db);
        let mut global = GlobalContext::new(Uuid::nil(), Utc::now());
        global.insert(context);
        global
    }

    #[test]
    fn test_region_view_counts() {
        let global = global();
        let view = RegionView::from(global.regions().next().unwrap());
        assert_eq!(view.orphaned_volumes, 1);
        assert_eq!(view.orphaned_instances, 0);
        assert_eq!(view.claimed, 2);
    }

    #[test]
    fn test_summary_table_lists_every_kind() {
        let output = format_summary_table(&global().summary());
        assert!(output.contains("Kind"));
        for kind in ResourceKind::ALL {
            assert!(output.contains(kind.label()));
        }
    }

    #[test]
    fn test_orphans_table_lists_orphans_only() {
        let output = format_orphans_table(&global());
        assert!(output.contains("v-orphan"));
        assert!(!output.contains("i-owned"));
    }

    #[test]
    fn test_audit_json_valid() {
        let output = format_audit_json(&global()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["orphans"].as_array().unwrap().len(), 1);
        assert_eq!(parsed["orphans"][0]["id"], "v-orphan");
        assert_eq!(parsed["idle_managed_db"][0], "c-idle");
        assert_eq!(parsed["regions"][0]["region"], REGION);
    }
}
