//! JSON snapshot directory
//!
//! Layout:
//!
//! ```text
//! <root>/managed-db.json
//! <root>/<account>/<region>.json
//! ```
//!
//! A missing file is an empty snapshot; a malformed one is an error.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use super::{InventorySource, ManagedDbSource, SourceError};
use crate::inventory::{ManagedDbSnapshot, RegionKey, RegionSnapshot};

pub const MANAGED_DB_FILE: &str = "managed-db.json";

#[derive(Debug, Clone)]
pub struct SnapshotDirSource {
    root: PathBuf,
}

impl SnapshotDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn region_path(&self, target: &RegionKey) -> PathBuf {
        self.root
            .join(&target.account)
            .join(format!("{}.json", target.region))
    }

    pub fn managed_db_path(&self) -> PathBuf {
        self.root.join(MANAGED_DB_FILE)
    }
}

async fn read_snapshot<T: DeserializeOwned + Default>(path: &Path) -> Result<T, SourceError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Snapshot file missing, treating as empty");
            return Ok(T::default());
        }
        Err(e) => {
            return Err(SourceError::Io {
                path: path.display().to_string(),
                source: e,
            })
        }
    };

    serde_json::from_str(&content).map_err(|e| SourceError::Parse {
        origin: path.display().to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl InventorySource for SnapshotDirSource {
    fn name(&self) -> &'static str {
        "snapshot_dir"
    }

    async fn fetch_region(&self, target: &RegionKey) -> Result<RegionSnapshot, SourceError> {
        read_snapshot(&self.region_path(target)).await
    }
}

#[async_trait]
impl ManagedDbSource for SnapshotDirSource {
    fn name(&self) -> &'static str {
        "snapshot_dir"
    }

    async fn fetch_managed_db(&self) -> Result<ManagedDbSnapshot, SourceError> {
        read_snapshot(&self.managed_db_path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let source = SnapshotDirSource::new("/data/snapshots");
        let key = RegionKey::new("111122223333", "eu-west-1");

        assert_eq!(
            source.region_path(&key),
            PathBuf::from("/data/snapshots/111122223333/eu-west-1.json")
        );
        assert_eq!(
            source.managed_db_path(),
            PathBuf::from("/data/snapshots/managed-db.json")
        );
    }

    #[tokio::test]
    async fn test_missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = SnapshotDirSource::new(dir.path());

        let region = source
            .fetch_region(&RegionKey::new("acct", "us-east-1"))
            .await
            .unwrap();
        let db = source.fetch_managed_db().await.unwrap();

        assert!(region.is_empty());
        assert!(db.accounts.is_empty() && db.clusters.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANAGED_DB_FILE), "{ not json").unwrap();
        let source = SnapshotDirSource::new(dir.path());

        let result = source.fetch_managed_db().await;

        assert!(matches!(result, Err(SourceError::Parse { .. })));
    }
}
