//! ColdTrack model layer
//!
//! Shared leaf crate for the telemetry pipeline: validated reading types,
//! stored-point representation, alert events, immutable pipeline
//! configuration, and the pure reading validator. No I/O happens here.

pub mod config;
pub mod error;
pub mod time;
pub mod types;
pub mod validation;

pub use config::PipelineConfig;
pub use error::{Result, ValidationError};
pub use time::{FixedTimeProvider, SystemTimeProvider, TimeProvider};
pub use types::{derive_idempotency_key, AlertEvent, AlertKind, Reading, StoredPoint};
pub use validation::validate;
