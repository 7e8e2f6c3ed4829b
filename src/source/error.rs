//! Error types for inventory sources

use thiserror::Error;

/// Errors that can occur while fetching inventory.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Snapshot file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot or response body doesn't match the expected format.
    #[error("Failed to parse {origin}: {message}")]
    Parse { origin: String, message: String },

    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Upstream API returned an error response (4xx, 5xx).
    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Source configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}
