//! Cascading cleanup report
//!
//! Flattens a [`GlobalContext`] into one section per resource kind, owners
//! first. Each section lists the resources left at the top level; resources
//! owned by another one are only counted under their owner.

pub mod error;
pub mod slack;

pub use error::ReportError;
pub use slack::{PostSummary, SlackPoster};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write;
use uuid::Uuid;

use crate::config::ReportConfig;
use crate::inventory::{
    CloudResource, Instance, ManagedCluster, ManagedDbAccount, ManagedDbCluster, Resource,
    ResourceKind, StackDeployment, Volume,
};
use crate::reconcile::GlobalContext;

pub const REPORT_HEADER: &str = "Below is a *cascading* report of our cloud infrastructure. \
If you have a resource in the list below, please consider whether it is in use or will be used \
again today. If the answer is no, please delete it.\n\n\
If you do need to keep a resource, try to use as few resources as possible!\n";

/// One labelled value of a report entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
}

/// One resource in a report section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub id: String,
    pub name: String,
    pub account: String,
    pub region: String,
    pub fields: Vec<Field>,
}

impl Entry {
    fn new(resource: &CloudResource) -> Self {
        Self {
            id: resource.id.clone(),
            name: resource.name.clone(),
            account: resource.account.clone(),
            region: resource.region.clone(),
            fields: Vec::new(),
        }
    }

    fn field(mut self, label: &'static str, value: impl ToString) -> Self {
        self.fields.push(Field {
            label,
            value: value.to_string(),
        });
        self
    }

    fn field_if(self, label: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.field(label, value),
            None => self,
        }
    }

    /// Slack mrkdwn rendering, one `*Label*: `value`` line per field.
    pub fn to_mrkdwn(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("*{}*: `{}`\n", f.label, f.value))
            .collect()
    }
}

/// All top-level resources of one kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub kind: ResourceKind,
    pub entries: Vec<Entry>,
}

impl Section {
    fn emoji(&self) -> &'static str {
        match self.kind {
            ResourceKind::ManagedDbAccount => ":thought_balloon:",
            ResourceKind::ManagedDbCluster => ":snow_cloud:",
            ResourceKind::StackDeployment => ":dango:",
            ResourceKind::ManagedCluster => ":dizzy:",
            ResourceKind::Instance => ":zap:",
            ResourceKind::Volume => ":orange_book:",
        }
    }

    pub fn title(&self) -> String {
        format!("{}  *{}* ({})", self.emoji(), self.kind.label(), self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub header: String,
    pub sections: Vec<Section>,
}

impl Report {
    /// Build the report. Sections are ordered owners first: managed DB
    /// accounts, managed DB clusters, stacks, managed clusters, instances,
    /// volumes. Managed DB entries repeated across regions are listed once.
    pub fn build(global: &GlobalContext, config: &ReportConfig) -> Self {
        let now = global.generated_at();
        let render = Renderer {
            date_format: &config.date_format,
            now,
        };

        let mut accounts = Dedup::default();
        let mut db_clusters = Dedup::default();
        let mut stacks = Vec::new();
        let mut managed_clusters = Vec::new();
        let mut instances = Vec::new();
        let mut volumes = Vec::new();

        for context in global.regions() {
            for root in context.roots() {
                match root {
                    Resource::ManagedDbAccount(a) => {
                        accounts.push(&a.resource.id, || render.db_account(a));
                        for cluster in a.managed_clusters.values() {
                            for db in cluster.db_clusters.values() {
                                db_clusters.push(&db.resource.id, || render.db_cluster(db));
                            }
                        }
                    }
                    Resource::ManagedDbCluster(c) => {
                        db_clusters.push(&c.resource.id, || render.db_cluster(c));
                    }
                    Resource::StackDeployment(s) => stacks.push(render.stack(s)),
                    Resource::ManagedCluster(c) => {
                        for db in c.db_clusters.values() {
                            db_clusters.push(&db.resource.id, || render.db_cluster(db));
                        }
                        managed_clusters.push(render.managed_cluster(c));
                    }
                    Resource::Instance(_) | Resource::Volume(_) => {}
                }
            }
            instances.extend(context.instances().values().map(|i| render.instance(i)));
            volumes.extend(context.volumes().values().map(|v| render.volume(v)));
        }

        let idle = global.idle_managed_db();
        for account in idle.accounts.values() {
            accounts.push(&account.resource.id, || render.db_account(account));
        }
        for cluster in idle.clusters.values() {
            db_clusters.push(&cluster.resource.id, || render.db_cluster(cluster));
        }

        let section = |kind, entries| Section { kind, entries };
        Self {
            run_id: global.run_id(),
            generated_at: now,
            header: REPORT_HEADER.to_string(),
            sections: vec![
                section(ResourceKind::ManagedDbAccount, accounts.entries),
                section(ResourceKind::ManagedDbCluster, db_clusters.entries),
                section(ResourceKind::StackDeployment, stacks),
                section(ResourceKind::ManagedCluster, managed_clusters),
                section(ResourceKind::Instance, instances),
                section(ResourceKind::Volume, volumes),
            ],
        }
    }

    pub fn section(&self, kind: ResourceKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Number of entries over all sections
    pub fn len(&self) -> usize {
        self.sections.iter().map(Section::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plain-text rendering of the whole thread, used for dry runs.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.header);
        for section in &self.sections {
            out.push('\n');
            out.push_str(&section.title());
            out.push('\n');
            for entry in &section.entries {
                out.push_str("  ---\n");
                for line in entry.to_mrkdwn().lines() {
                    out.push_str("  ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        out
    }
}

#[derive(Default)]
struct Dedup {
    seen: BTreeSet<String>,
    entries: Vec<Entry>,
}

impl Dedup {
    fn push(&mut self, id: &str, entry: impl FnOnce() -> Entry) {
        if self.seen.insert(id.to_string()) {
            self.entries.push(entry());
        }
    }
}

struct Renderer<'a> {
    date_format: &'a str,
    now: DateTime<Utc>,
}

impl Renderer<'_> {
    fn date(&self, at: Option<DateTime<Utc>>) -> String {
        let Some(t) = at else {
            return "unknown".to_string();
        };
        let mut out = String::new();
        if write!(out, "{}", t.format(self.date_format)).is_err() {
            // Unrenderable format; fall back to RFC 3339
            return t.to_rfc3339();
        }
        out
    }

    fn age(&self, age: Option<Duration>, created_at: Option<DateTime<Utc>>) -> String {
        age.or_else(|| created_at.map(|t| self.now - t))
            .map(format_age)
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn db_account(&self, a: &ManagedDbAccount) -> Entry {
        Entry::new(&a.resource)
            .field("Name", &a.resource.name)
            .field("Provider", &a.provider)
            .field("Region", &a.resource.region)
            .field("Virtual Network CIDR", &a.network_cidr)
            .field(ResourceKind::ManagedCluster.label(), a.managed_clusters.len())
            .field_if("Stack", a.stack.as_ref().map(|s| &s.resource.name))
            .field("Status", &a.status)
    }

    fn db_cluster(&self, c: &ManagedDbCluster) -> Entry {
        Entry::new(&c.resource)
            .field("Name", &c.resource.name)
            .field("Node Count", c.node_count)
            .field("Services", c.services.join(", "))
            .field_if("Environment", c.environment.as_ref())
            .field_if("Managed Cluster", c.linked_cluster_name.as_ref())
            .field_if(
                ResourceKind::Instance.label(),
                Some(c.instances.len()).filter(|n| *n > 0),
            )
    }

    fn stack(&self, s: &StackDeployment) -> Entry {
        Entry::new(&s.resource)
            .field("Name", &s.resource.name)
            .field("Region", &s.resource.region)
            .field("Resource Count", s.declared_resources.len())
            .field("Age", self.age(s.age, s.resource.created_at))
            .field_if(
                ResourceKind::Instance.label(),
                Some(s.instances.len()).filter(|n| *n > 0),
            )
            .field("Created", self.date(s.resource.created_at))
    }

    fn managed_cluster(&self, c: &ManagedCluster) -> Entry {
        Entry::new(&c.resource)
            .field("Name", &c.resource.name)
            .field("Region", &c.resource.region)
            .field("Worker Nodes", c.instances.len())
            .field("Subnets", c.subnet_ids.len())
            .field("Age", self.age(c.age, c.resource.created_at))
            .field("Created", self.date(c.resource.created_at))
    }

    fn instance(&self, i: &Instance) -> Entry {
        Entry::new(&i.resource)
            .field("Name", &i.resource.name)
            .field("Region", &i.resource.region)
            .field("Type", &i.instance_type)
            .field_if("Platform", i.platform.as_ref())
            .field_if("Key Name", i.key_name.as_ref())
            .field("Launch Time", self.date(i.resource.created_at))
    }

    fn volume(&self, v: &Volume) -> Entry {
        Entry::new(&v.resource)
            .field("Name", &v.resource.name)
            .field("Region", &v.resource.region)
            .field("Type", v.volume_type.as_deref().unwrap_or("unknown"))
            .field("Size GiB", v.size_gib)
            .field("State", &v.state)
            .field("Created", self.date(v.resource.created_at))
    }
}

/// Compact age such as `3d 4h`, `5h 12m` or `42m`.
pub fn format_age(age: Duration) -> String {
    let minutes = age.num_minutes().max(0);
    let (days, hours, mins) = (minutes / 1440, (minutes / 60) % 24, minutes % 60);
    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
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
        let pipeline = ClaimPipeline::standard(&ClaimKeys::default());
        let mut db = ManagedDbPool::default();
        db.accounts.insert("c1".to_string(), db_account("c1"));
        db.accounts.insert("c2".to_string(), db_account("c2"));
        let mut linked = db_cluster("db1");
        linked.resource.name = "orders".to_string();
        db.clusters.insert("db1".to_string(), linked);

        let mut global = GlobalContext::new(Uuid::new_v4(), Utc::now());
        for region in ["us-east-1", "eu-west-1"] {
            let mut pool = ResourcePool::new(RegionKey::new(ACCOUNT, region));
            if region == "us-east-1" {
                pool.insert_instance(instance(
                    "i1",
                    "sub1",
                    &[("DatabaseID", "db1"), ("cluster", "eks1")],
                    &[],
                ));
                pool.insert_managed_cluster(managed_cluster("eks1", &["sub9"], &[("CloudID", "c1")]));
            }
            pool.insert_volume(volume("v1"));
            global.insert(pipeline.reconcile(pool, db.clone()));
        }
        global
    }

    #[test]
    fn test_sections_in_owner_first_order() {
        let report = Report::build(&global(), &ReportConfig::default());
        let kinds: Vec<ResourceKind> = report.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::ManagedDbAccount,
                ResourceKind::ManagedDbCluster,
                ResourceKind::StackDeployment,
                ResourceKind::ManagedCluster,
                ResourceKind::Instance,
                ResourceKind::Volume,
            ]
        );
    }

    #[test]
    fn test_managed_db_entries_listed_once() {
        let report = Report::build(&global(), &ReportConfig::default());

        let accounts = report.section(ResourceKind::ManagedDbAccount).unwrap();
        let ids: Vec<&str> = accounts.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);

        let clusters = report.section(ResourceKind::ManagedDbCluster).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters.entries[0].name, "orders");
    }

    #[test]
    fn test_claimed_resources_not_listed_at_top_level() {
        let report = Report::build(&global(), &ReportConfig::default());

        assert!(report.section(ResourceKind::ManagedCluster).unwrap().is_empty());
        assert!(report.section(ResourceKind::Instance).unwrap().is_empty());
        assert_eq!(report.section(ResourceKind::Volume).unwrap().len(), 2);
    }

    #[test]
    fn test_section_title_and_mrkdwn() {
        let report = Report::build(&global(), &ReportConfig::default());
        let volumes = report.section(ResourceKind::Volume).unwrap();

        assert_eq!(volumes.title(), ":orange_book:  *Volumes* (2)");
        let text = volumes.entries[0].to_mrkdwn();
        assert!(text.starts_with("*Name*: `v1`\n"));
        assert!(text.contains("*Size GiB*: `100`\n"));
        assert!(text.contains("*Created*: `unknown`\n"));
    }

    #[test]
    fn test_date_format() {
        let render = Renderer {
            date_format: &ReportConfig::default().date_format,
            now: Utc::now(),
        };
        let at = "2024-01-05T15:04:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(render.date(Some(at)), "5 Jan, 2024 at 3:04pm (UTC)");
    }

    #[test]
    fn test_invalid_date_format_falls_back() {
        let render = Renderer {
            date_format: "%Q",
            now: Utc::now(),
        };
        let at = "2024-01-05T15:04:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(render.date(Some(at)), "2024-01-05T15:04:00+00:00");
    }

    #[test]
    fn test_build_with_invalid_date_format_does_not_panic() {
        let config = ReportConfig {
            date_format: "%Q".to_string(),
            ..Default::default()
        };
        let mut global = global();
        let mut pool = ResourcePool::new(RegionKey::new(ACCOUNT, "ap-south-1"));
        let mut dated = volume("v-dated");
        dated.resource.created_at = Some(Utc::now());
        pool.insert_volume(dated);
        let pipeline = ClaimPipeline::standard(&ClaimKeys::default());
        global.insert(pipeline.reconcile(pool, ManagedDbPool::default()));

        let report = Report::build(&global, &config);
        assert_eq!(report.section(ResourceKind::Volume).unwrap().len(), 3);
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::minutes(42)), "42m");
        assert_eq!(format_age(Duration::minutes(5 * 60 + 12)), "5h 12m");
        assert_eq!(format_age(Duration::hours(76)), "3d 4h");
        assert_eq!(format_age(Duration::minutes(-5)), "0m");
    }
}
