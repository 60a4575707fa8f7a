//! Time provider abstraction for pipeline operations
//!
//! Separates time acquisition from validation and orchestration logic,
//! allowing fixed time sources in tests. Telemetry timestamps are epoch
//! seconds, so the provider works in seconds as well.

use std::time::{SystemTime, UNIX_EPOCH};

/// Time provider trait for generating timestamps
///
/// Abstracts time acquisition, allowing:
/// - System time for production use
/// - Fixed time for deterministic tests
pub trait TimeProvider: Send + Sync + 'static {
    /// Get current timestamp in seconds since Unix epoch
    fn now_secs(&self) -> i64;
}

/// System time provider using the local clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_secs(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("System time before Unix epoch")
            .as_secs() as i64
    }
}

/// Fixed time provider for testing
///
/// Returns a predetermined timestamp, useful for deterministic tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedTimeProvider {
    timestamp_secs: i64,
}

impl FixedTimeProvider {
    /// Create a new fixed time provider with the given timestamp
    pub fn new(timestamp_secs: i64) -> Self {
        Self { timestamp_secs }
    }
}

impl TimeProvider for FixedTimeProvider {
    fn now_secs(&self) -> i64 {
        self.timestamp_secs
    }
}
