//! Trait definitions for the telemetry store abstraction

use crate::error::Result;
use async_trait::async_trait;
use coldtrack_model::StoredPoint;
use serde::{Deserialize, Serialize};

/// Outcome of an idempotent point write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// First write of this (device_id, idempotency_key) pair
    Inserted,
    /// Key already present; the stored point was left untouched
    DuplicateIgnored,
}

/// Telemetry Store Trait
///
/// Minimal storage interface the pipeline needs from a time-series backend:
/// an atomic idempotent point insert and an ordered range query. Everything
/// else (retention, compaction, replication) is the backend's business.
///
/// Implementations:
/// - `SqliteStore`: durable SQLite backend
/// - `MemoryStore`: in-memory backend for testing
#[async_trait]
pub trait TelemetryStore: Send + Sync + 'static {
    /// Insert a point if its `(device_id, idempotency_key)` is not yet stored
    ///
    /// Must be an atomic insert-if-absent at the storage layer; a prior read
    /// must never be used to decide whether to write. Returns
    /// [`WriteOutcome::DuplicateIgnored`] on every call after the first for a
    /// given key, and never alters the first stored value.
    async fn insert_point(&self, point: &StoredPoint) -> Result<WriteOutcome>;

    /// Query stored points for one device with `since <= timestamp <= until`
    ///
    /// Returns points ordered by timestamp ascending. Reflects only writes
    /// committed before the read began; a write for the same device that
    /// completed before this call must be visible.
    async fn query_window(
        &self,
        device_id: &str,
        since: i64,
        until: i64,
    ) -> Result<Vec<StoredPoint>>;

    /// Number of stored points for a device (diagnostics and tests)
    async fn point_count(&self, device_id: &str) -> Result<u64>;
}
