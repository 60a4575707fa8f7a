//! Error types for coldtrack-store

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence adapter errors
///
/// Transient by nature; the adapter itself never retries. Retry policy
/// belongs to the pipeline orchestrator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Invalid stored data for device {device_id}: {reason}")]
    CorruptPoint { device_id: String, reason: String },

    #[error("Invalid query window: since {since} > until {until}")]
    InvalidWindow { since: i64, until: i64 },
}
