//! Core telemetry types
//!
//! - Reading: one validated, immutable telemetry sample
//! - StoredPoint: the persisted representation, keyed by (device, idempotency key)
//! - AlertEvent / AlertKind: evaluation output handed to the dispatcher

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

// ============================================================================
// Reading
// ============================================================================

/// One validated telemetry sample
///
/// Produced only by [`crate::validation::validate`]; immutable afterwards.
/// Optional fields are `None` when the device did not report them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Device identifier, non-empty
    pub device_id: String,

    /// Sample time, seconds since Unix epoch
    pub timestamp: i64,

    /// Payload temperature in degrees Celsius
    pub temperature: f64,

    /// Relative humidity percentage [0, 100]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,

    /// Battery charge percentage [0, 100]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,

    /// GPS latitude in decimal degrees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// GPS longitude in decimal degrees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Radio signal strength in dBm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i64>,

    /// Device-assigned monotonic message counter, used as idempotency key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
}

impl Reading {
    /// Idempotency key for this reading
    ///
    /// `message_id` verbatim when the device supplied one, otherwise a
    /// deterministic key derived from `(device_id, timestamp)` so that
    /// redelivered copies of the same sample collapse onto one stored point.
    pub fn idempotency_key(&self) -> i64 {
        match self.message_id {
            Some(id) => id,
            None => derive_idempotency_key(&self.device_id, self.timestamp),
        }
    }

    /// Convert into the persisted representation
    pub fn to_point(&self) -> StoredPoint {
        StoredPoint {
            device_id: self.device_id.clone(),
            idempotency_key: self.idempotency_key(),
            timestamp: self.timestamp,
            temperature: self.temperature,
            humidity: self.humidity,
            battery: self.battery,
            latitude: self.latitude,
            longitude: self.longitude,
            rssi: self.rssi,
        }
    }
}

/// Derive a deterministic idempotency key from `(device_id, timestamp)`
///
/// SHA-256 over the identifier and the big-endian timestamp, truncated to the
/// low 63 bits so the key stays non-negative alongside device-assigned
/// `message_id` values.
pub fn derive_idempotency_key(device_id: &str, timestamp: i64) -> i64 {
    let mut hasher = Sha256::new();
    hasher.update(device_id.as_bytes());
    hasher.update(timestamp.to_be_bytes());
    let digest = hasher.finalize();

    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(buf) & i64::MAX
}

// ============================================================================
// StoredPoint
// ============================================================================

/// Persisted telemetry point
///
/// Owned exclusively by the persistence adapter. Created on the first
/// successful write of its `(device_id, idempotency_key)` pair and never
/// mutated afterwards; deletion is left to external retention policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPoint {
    pub device_id: String,
    pub idempotency_key: i64,
    pub timestamp: i64,
    pub temperature: f64,
    pub humidity: Option<f64>,
    pub battery: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rssi: Option<i64>,
}

// ============================================================================
// Alerts
// ============================================================================

/// Alert classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    OutOfRangeHigh,
    OutOfRangeLow,
    FreezeCritical,
    FreezeScoreSevere,
    BatteryLow,
    BatteryCritical,
    HumidityOutOfRange,
}

impl AlertKind {
    /// Wire/log name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfRangeHigh => "OUT_OF_RANGE_HIGH",
            Self::OutOfRangeLow => "OUT_OF_RANGE_LOW",
            Self::FreezeCritical => "FREEZE_CRITICAL",
            Self::FreezeScoreSevere => "FREEZE_SCORE_SEVERE",
            Self::BatteryLow => "BATTERY_LOW",
            Self::BatteryCritical => "BATTERY_CRITICAL",
            Self::HumidityOutOfRange => "HUMIDITY_OUT_OF_RANGE",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One triggered alert
///
/// The core produces exactly one event per distinct
/// `(device_id, kind, triggering reading)`; persistence and delivery beyond
/// the notification collaborator are external concerns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,

    /// Severity in [0, 1]
    pub severity: f64,

    pub device_id: String,

    /// Timestamp of the reading that triggered the alert, epoch seconds
    pub triggering_timestamp: i64,

    /// Free-form context for human-readable notifications
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, Value>,
}

impl AlertEvent {
    /// Create a new alert with empty details
    pub fn new(kind: AlertKind, severity: f64, device_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            kind,
            severity,
            device_id: device_id.into(),
            triggering_timestamp: timestamp,
            details: HashMap::new(),
        }
    }

    /// Attach a detail entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}
