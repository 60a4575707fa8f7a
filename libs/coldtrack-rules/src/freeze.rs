//! Freeze-damage scoring
//!
//! Combines depth, duration, and frequency of sub-threshold excursions
//! within a trailing window into one severity score. The arithmetic core
//! (`partition_runs`, `score_window`) is a pure function of the window and
//! configuration; [`FreezeScorer`] wraps it with the history query, anchored
//! to the triggering reading's timestamp so replays score identically.

use crate::error::ScoringError;
use coldtrack_model::{AlertEvent, AlertKind, PipelineConfig, Reading, StoredPoint};
use coldtrack_store::TelemetryStore;
use serde::Serialize;
use std::sync::Arc;

// ============================================================================
// Pure window arithmetic
// ============================================================================

/// One maximal contiguous run of sub-threshold points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreezeRun {
    /// Timestamp of the first point in the run
    pub start_ts: i64,
    /// Timestamp of the last point in the run
    pub end_ts: i64,
    /// Coldest temperature observed in the run
    pub min_temperature: f64,
    /// Number of samples in the run
    pub samples: usize,
}

impl FreezeRun {
    /// Degrees Celsius below the freeze threshold, non-negative
    pub fn depth(&self, threshold: f64) -> f64 {
        (threshold - self.min_temperature).max(0.0)
    }

    /// Run span in seconds; a single-point run has duration 0
    pub fn duration_secs(&self) -> i64 {
        self.end_ts - self.start_ts
    }
}

/// Multi-dimensional freeze-damage score for one window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreezeScore {
    /// Worst excursion depth, normalized by the depth saturation constant
    pub depth_score: f64,
    /// Longest run duration, normalized by the duration saturation constant
    pub duration_score: f64,
    /// Run count, normalized by the frequency saturation constant
    pub frequency_score: f64,
    /// Probabilistic-OR combination of the three component scores
    pub composite: f64,
    /// Number of distinct freeze runs in the window
    pub run_count: usize,
    /// Depth of the deepest run, degrees C below threshold
    pub worst_depth: f64,
    /// Duration of the longest run, seconds
    pub worst_duration_secs: i64,
}

impl FreezeScore {
    /// Score for a window with no sub-threshold points
    fn clean() -> Self {
        Self {
            depth_score: 0.0,
            duration_score: 0.0,
            frequency_score: 0.0,
            composite: 0.0,
            run_count: 0,
            worst_depth: 0.0,
            worst_duration_secs: 0,
        }
    }
}

/// Partition an ordered window into maximal contiguous freeze runs
///
/// A point belongs to a run when `temperature <= freeze_alert_threshold`.
/// Two consecutive sub-threshold points join the same run only when their
/// timestamp gap is at most `max_sample_gap_secs`; a larger gap is a
/// connectivity gap and must not be conflated with a continuous freeze
/// event.
///
/// `points` must be ordered by timestamp ascending, as returned by the
/// store's window query.
pub fn partition_runs(points: &[StoredPoint], config: &PipelineConfig) -> Vec<FreezeRun> {
    let threshold = config.freeze_alert_threshold;
    let max_gap = config.max_sample_gap_secs;

    let mut runs: Vec<FreezeRun> = Vec::new();
    let mut current: Option<FreezeRun> = None;
    let mut prev_ts: i64 = 0;

    for point in points {
        if point.temperature > threshold {
            // Warm sample ends any open run
            if let Some(run) = current.take() {
                runs.push(run);
            }
            continue;
        }

        match current.as_mut() {
            Some(run) if point.timestamp - prev_ts <= max_gap => {
                run.end_ts = point.timestamp;
                run.min_temperature = run.min_temperature.min(point.temperature);
                run.samples += 1;
            },
            _ => {
                // Either no open run, or the gap was too large to join
                if let Some(run) = current.take() {
                    runs.push(run);
                }
                current = Some(FreezeRun {
                    start_ts: point.timestamp,
                    end_ts: point.timestamp,
                    min_temperature: point.temperature,
                    samples: 1,
                });
            },
        }
        prev_ts = point.timestamp;
    }

    if let Some(run) = current.take() {
        runs.push(run);
    }
    runs
}

/// Score one window of stored points
///
/// Pure function of `(points, config)`: recomputing with a window extended
/// by strictly later points never changes what an earlier window scored.
pub fn score_window(points: &[StoredPoint], config: &PipelineConfig) -> FreezeScore {
    let runs = partition_runs(points, config);
    if runs.is_empty() {
        return FreezeScore::clean();
    }

    let threshold = config.freeze_alert_threshold;
    let worst_depth = runs
        .iter()
        .map(|r| r.depth(threshold))
        .fold(0.0_f64, f64::max);
    let worst_duration_secs = runs.iter().map(FreezeRun::duration_secs).max().unwrap_or(0);

    let depth_score = (worst_depth / config.depth_sat).min(1.0);
    let duration_score = (worst_duration_secs as f64 / config.duration_sat_secs).min(1.0);
    let frequency_score = (runs.len() as f64 / config.frequency_sat as f64).min(1.0);

    // Probabilistic OR: one dominant dimension can approach 1.0 on its own,
    // while several moderate dimensions still compound.
    let composite =
        1.0 - (1.0 - depth_score) * (1.0 - duration_score) * (1.0 - frequency_score);

    FreezeScore {
        depth_score,
        duration_score,
        frequency_score,
        composite,
        run_count: runs.len(),
        worst_depth,
        worst_duration_secs,
    }
}

// ============================================================================
// Store-backed scorer
// ============================================================================

/// Freeze-damage scorer over stored history
///
/// Fetches the trailing window ending at the triggering reading's timestamp
/// and emits `FREEZE_SCORE_SEVERE` when the composite crosses the configured
/// threshold.
pub struct FreezeScorer<S: TelemetryStore> {
    store: Arc<S>,
}

impl<S: TelemetryStore> FreezeScorer<S> {
    /// Create a scorer over the given store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Score the device's trailing window as of the given reading
    ///
    /// The window is `[reading.timestamp - window_span, reading.timestamp]`;
    /// later arrivals never change what this call reports for this reading.
    pub async fn score_as_of(
        &self,
        reading: &Reading,
        config: &PipelineConfig,
    ) -> Result<FreezeScore, ScoringError> {
        let since = reading.timestamp - config.window_span_secs;
        let points = self
            .store
            .query_window(&reading.device_id, since, reading.timestamp)
            .await?;
        Ok(score_window(&points, config))
    }

    /// Evaluate the severe-score rule for one reading
    ///
    /// Returns `Ok(Some(event))` when the composite reaches the severe
    /// threshold, with per-dimension scores and the worst run's depth and
    /// duration in the event details.
    pub async fn evaluate(
        &self,
        reading: &Reading,
        config: &PipelineConfig,
    ) -> Result<Option<AlertEvent>, ScoringError> {
        let score = self.score_as_of(reading, config).await?;
        if score.composite < config.freeze_score_severe_threshold {
            return Ok(None);
        }

        Ok(Some(
            AlertEvent::new(
                AlertKind::FreezeScoreSevere,
                score.composite,
                &reading.device_id,
                reading.timestamp,
            )
            .with_detail("depth_score", score.depth_score)
            .with_detail("duration_score", score.duration_score)
            .with_detail("frequency_score", score.frequency_score)
            .with_detail("run_count", score.run_count as u64)
            .with_detail("worst_depth", score.worst_depth)
            .with_detail("worst_duration_secs", score.worst_duration_secs),
        ))
    }
}
