//! ColdTrack persistence adapter
//!
//! Durable, idempotent time-series storage for validated telemetry points
//! behind the [`TelemetryStore`] trait:
//! - `MemoryStore`: DashMap-backed backend for testing and embedded scenarios
//! - `SqliteStore`: durable SQLite backend for edge deployment
//!
//! The write primitive is an atomic insert-if-absent keyed by
//! `(device_id, idempotency_key)`; redelivered readings collapse onto the
//! first stored point and never alter it.

pub mod error;
pub mod memory_impl;
pub mod sqlite_impl;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory_impl::MemoryStore;
pub use sqlite_impl::SqliteStore;
pub use traits::{TelemetryStore, WriteOutcome};
