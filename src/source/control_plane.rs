//! Managed-database control-plane client
//!
//! Lists accounts ("clouds") and clusters through the paginated REST API:
//! - `GET /v2/clouds`
//! - `GET /v2/clusters`
//! - `GET /v3/clusters` (hosted clusters, only added when not listed by v2)
//!
//! Every configured API key is queried in turn and the results merged by ID.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use super::{ManagedDbSource, SourceError};
use crate::config::ControlPlaneConfig;
use crate::inventory::snapshot::{ManagedDbAccountRecord, ManagedDbClusterRecord};
use crate::inventory::ManagedDbSnapshot;

pub struct ControlPlaneClient {
    base_url: String,
    api_keys: Vec<String>,
    per_page: u32,
    timeout: Duration,
    client: Client,
}

impl ControlPlaneClient {
    pub fn new(
        base_url: impl Into<String>,
        api_keys: Vec<String>,
        per_page: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_keys,
            per_page,
            timeout,
            client: Client::new(),
        }
    }

    /// Build a client, reading API keys from the configured environment variables.
    pub fn from_config(config: &ControlPlaneConfig) -> Result<Self, SourceError> {
        let mut api_keys = Vec::with_capacity(config.api_key_envs.len());
        for name in &config.api_key_envs {
            match std::env::var(name) {
                Ok(key) if !key.is_empty() => api_keys.push(key),
                _ => {
                    return Err(SourceError::Configuration(format!(
                        "environment variable {} is not set",
                        name
                    )))
                }
            }
        }
        if api_keys.is_empty() {
            return Err(SourceError::Configuration(
                "no control plane API keys configured".to_string(),
            ));
        }

        Ok(Self::new(
            config.base_url.clone(),
            api_keys,
            config.per_page,
            Duration::from_secs(config.timeout_seconds),
        ))
    }

    async fn get_page<P: DeserializeOwned>(
        &self,
        path: &str,
        api_key: &str,
        page: u32,
    ) -> Result<P, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        let timeout_ms = self.timeout.as_millis() as u64;

        let response = self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .query(&[("page", page), ("perPage", self.per_page)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout(timeout_ms)
                } else {
                    SourceError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| SourceError::Parse {
            origin: url,
            message: e.to_string(),
        })
    }

    /// Fetch every page of a listing. A page without a last-page cursor is the last one.
    async fn list_all<P: Paged>(&self, path: &str, api_key: &str) -> Result<Vec<P::Item>, SourceError> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let response: P = self.get_page(path, api_key, page).await?;
            let (batch, last) = response.into_parts();
            items.extend(batch);

            if page >= last.unwrap_or(page) {
                break;
            }
            page += 1;
        }

        Ok(items)
    }
}

trait Paged: DeserializeOwned {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<u32>);
}

#[derive(Deserialize, Default)]
struct Cursor {
    #[serde(default)]
    pages: Pages,
}

#[derive(Deserialize, Default)]
struct Pages {
    last: Option<u32>,
}

#[derive(Deserialize)]
struct ListPage<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    cursor: Cursor,
}

impl<T: DeserializeOwned> Paged for ListPage<T> {
    type Item = T;

    fn into_parts(self) -> (Vec<T>, Option<u32>) {
        (self.data, self.cursor.pages.last)
    }
}

#[derive(Deserialize)]
struct HostedPage {
    data: HostedData,
    #[serde(default)]
    cursor: Cursor,
}

#[derive(Deserialize)]
struct HostedData {
    #[serde(default)]
    items: Vec<HostedCluster>,
}

impl Paged for HostedPage {
    type Item = HostedCluster;

    fn into_parts(self) -> (Vec<HostedCluster>, Option<u32>) {
        (self.data.items, self.cursor.pages.last)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Cloud {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    provider: String,
    #[serde(default)]
    status: String,
    #[serde(default, rename = "virtualNetworkCIDR")]
    virtual_network_cidr: String,
    #[serde(default, rename = "virtualNetworkID")]
    virtual_network_id: String,
}

#[derive(Deserialize)]
struct Cluster {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    nodes: u32,
    #[serde(default)]
    services: Vec<String>,
}

#[derive(Deserialize)]
struct HostedCluster {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    environment: Option<String>,
}

#[async_trait]
impl ManagedDbSource for ControlPlaneClient {
    fn name(&self) -> &'static str {
        "control_plane"
    }

    async fn fetch_managed_db(&self) -> Result<ManagedDbSnapshot, SourceError> {
        let mut accounts: BTreeMap<String, ManagedDbAccountRecord> = BTreeMap::new();
        let mut clusters: BTreeMap<String, ManagedDbClusterRecord> = BTreeMap::new();

        for api_key in &self.api_keys {
            let clouds: Vec<Cloud> = self.list_all::<ListPage<Cloud>>("/v2/clouds", api_key).await?;
            tracing::info!(count = clouds.len(), "Found managed DB accounts");
            for cloud in clouds {
                accounts.insert(
                    cloud.id.clone(),
                    ManagedDbAccountRecord {
                        id: cloud.id,
                        name: cloud.name,
                        provider: cloud.provider,
                        status: cloud.status,
                        region: cloud.region,
                        network_cidr: cloud.virtual_network_cidr,
                        network_id: cloud.virtual_network_id,
                    },
                );
            }

            let listed: Vec<Cluster> =
                self.list_all::<ListPage<Cluster>>("/v2/clusters", api_key).await?;
            tracing::info!(count = listed.len(), "Found managed DB clusters");
            for cluster in listed {
                clusters.insert(
                    cluster.id.clone(),
                    ManagedDbClusterRecord {
                        id: cluster.id,
                        name: cluster.name,
                        node_count: cluster.nodes,
                        services: cluster.services,
                        environment: None,
                    },
                );
            }

            let hosted = self.list_all::<HostedPage>("/v3/clusters", api_key).await?;
            let mut added = 0;
            for cluster in hosted {
                if clusters.contains_key(&cluster.id) {
                    continue;
                }
                added += 1;
                clusters.insert(
                    cluster.id.clone(),
                    ManagedDbClusterRecord {
                        id: cluster.id,
                        name: cluster.name,
                        node_count: 0,
                        services: Vec::new(),
                        environment: cluster.environment,
                    },
                );
            }
            tracing::info!(count = added, "Found hosted managed DB clusters");
        }

        Ok(ManagedDbSnapshot {
            accounts: accounts.into_values().collect(),
            clusters: clusters.into_values().collect(),
        })
    }
}
