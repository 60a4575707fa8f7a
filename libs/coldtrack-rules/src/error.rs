//! Rule Engine Error Types

use thiserror::Error;

/// Freeze-damage scoring errors
///
/// Scoring reads stored history; the only way it can fail is the store.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// History query failed
    #[error("History query failed: {0}")]
    Query(#[from] coldtrack_store::StoreError),
}

/// Alert dispatch errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// One or more notification deliveries failed
    #[error("Notification delivery failed for {failed} of {attempted} alerts: {first_error}")]
    Delivery {
        attempted: usize,
        failed: usize,
        first_error: String,
    },
}
