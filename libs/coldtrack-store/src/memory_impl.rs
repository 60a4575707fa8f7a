//! In-memory telemetry store implementation
//!
//! Uses DashMap for lock-free concurrent access. Perfect for testing and
//! embedded scenarios. The per-device shard's entry API gives the atomic
//! insert-if-absent the idempotency contract requires.

use crate::error::{Result, StoreError};
use crate::traits::{TelemetryStore, WriteOutcome};
use async_trait::async_trait;
use coldtrack_model::StoredPoint;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory telemetry store with concurrent access support
///
/// Points are held per device, keyed by idempotency key.
pub struct MemoryStore {
    devices: Arc<DashMap<String, DashMap<i64, StoredPoint>>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            devices: Arc::new(DashMap::new()),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.devices.clear();
    }

    /// Number of devices with at least one stored point
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetryStore for MemoryStore {
    async fn insert_point(&self, point: &StoredPoint) -> Result<WriteOutcome> {
        let device = self
            .devices
            .entry(point.device_id.clone())
            .or_default()
            .downgrade();

        // Entry holds the shard lock, so concurrent writers of the same key
        // serialize here and exactly one observes Vacant.
        let outcome = match device.entry(point.idempotency_key) {
            Entry::Occupied(_) => Ok(WriteOutcome::DuplicateIgnored),
            Entry::Vacant(slot) => {
                slot.insert(point.clone());
                Ok(WriteOutcome::Inserted)
            },
        };
        drop(device);
        outcome
    }

    async fn query_window(
        &self,
        device_id: &str,
        since: i64,
        until: i64,
    ) -> Result<Vec<StoredPoint>> {
        if since > until {
            return Err(StoreError::InvalidWindow { since, until });
        }

        let mut points: Vec<StoredPoint> = match self.devices.get(device_id) {
            Some(device) => device
                .iter()
                .filter(|entry| {
                    let ts = entry.value().timestamp;
                    ts >= since && ts <= until
                })
                .map(|entry| entry.value().clone())
                .collect(),
            None => return Ok(vec![]),
        };

        // Ascending by timestamp; key as tie-break for a stable order
        points.sort_by_key(|p| (p.timestamp, p.idempotency_key));
        Ok(points)
    }

    async fn point_count(&self, device_id: &str) -> Result<u64> {
        Ok(self
            .devices
            .get(device_id)
            .map(|device| device.len() as u64)
            .unwrap_or(0))
    }
}
