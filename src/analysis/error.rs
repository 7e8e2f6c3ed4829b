//! Error types for an analysis run

use thiserror::Error;

use crate::config::ConfigError;
use crate::inventory::RegionKey;
use crate::source::SourceError;

/// Errors that abort an analysis run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Configuration could not produce a target list
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The managed-database snapshot could not be fetched
    #[error("Unable to fetch managed DB entities: {0}")]
    ManagedDb(#[source] SourceError),

    /// One region's snapshot could not be fetched
    #[error("Unable to fetch inventory for {target}: {source}")]
    Region {
        target: RegionKey,
        #[source]
        source: SourceError,
    },
}
