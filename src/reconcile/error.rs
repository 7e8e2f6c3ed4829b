//! Error types for claim pipeline construction

use thiserror::Error;

use super::Stage;

/// Errors raised when assembling a [`ClaimPipeline`](super::ClaimPipeline).
///
/// Running a pipeline never fails; only an ill-ordered stage list is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// A stage was placed after one that must run later
    #[error("Stage '{stage}' cannot run after '{after}'")]
    OutOfOrder { stage: Stage, after: Stage },

    /// The same stage appears twice
    #[error("Stage '{0}' appears more than once")]
    DuplicateStage(Stage),
}
