//! Pipeline error types

use coldtrack_model::ValidationError;
use coldtrack_rules::DispatchError;
use coldtrack_store::StoreError;
use thiserror::Error;

/// Stage at which a pipeline invocation failed
///
/// Evaluation has no failure stage: scoring errors degrade to a partial
/// report instead of failing the reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validate,
    Persist,
    Dispatch,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::Persist => "persist",
            Self::Dispatch => "dispatch",
        };
        f.write_str(name)
    }
}

/// Pipeline processing errors, tagged with the stage that failed
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed input; never retried, retrying cannot make it valid
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Persistence still failing after the bounded local retries; the
    /// transport layer owns redelivery from here
    #[error("Persistence failed after {attempts} attempts: {source}")]
    Persistence { attempts: u32, source: StoreError },

    /// Notification delivery failed; the reading itself is already persisted
    #[error("Alert dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl PipelineError {
    /// Stage at which the invocation failed
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Validation(_) => PipelineStage::Validate,
            Self::Persistence { .. } => PipelineStage::Persist,
            Self::Dispatch(_) => PipelineStage::Dispatch,
        }
    }

    /// Whether redelivering the same reading can succeed later
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Validation(_))
    }
}
