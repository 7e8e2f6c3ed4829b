//! Error types for report delivery

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    /// A required environment variable is unset or empty
    #[error("Environment variable {0} not found")]
    MissingEnv(String),

    /// Network connectivity error while posting
    #[error("Network error: {0}")]
    Network(String),

    /// Slack rejected the message
    #[error("Unable to post messages to Slack: {0}")]
    Slack(String),
}
