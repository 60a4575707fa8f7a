//! ColdTrack rule engine
//!
//! Evaluation layer of the telemetry pipeline:
//! - `thresholds`: stateless per-reading checks against configured bounds
//! - `freeze`: windowed freeze-damage scoring over stored history
//! - `dispatcher`: deduplicating forwarder to the notification collaborator

pub mod dispatcher;
pub mod error;
pub mod freeze;
pub mod thresholds;

pub use dispatcher::{AlertDispatcher, LogNotifier, MemoryNotifier, Notifier};
pub use error::{DispatchError, ScoringError};
pub use freeze::{partition_runs, score_window, FreezeRun, FreezeScore, FreezeScorer};
pub use thresholds::evaluate;
