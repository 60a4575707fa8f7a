//! Pipeline configuration
//!
//! Immutable configuration passed explicitly into every validation,
//! evaluation, and scoring call. There is no global mutable state: callers
//! construct one `PipelineConfig` and share it by reference for the lifetime
//! of a processing run.

use serde::{Deserialize, Serialize};

/// Threshold, scoring, and skew configuration for the telemetry pipeline
///
/// All temperatures are in degrees Celsius, percentages in [0, 100], and
/// durations in seconds. Defaults match a pharmaceutical cold-chain payload
/// (2-8 degrees C storage band, freeze damage at 0 degrees C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Lower bound of the acceptable temperature band
    #[serde(default = "default_temp_min")]
    pub temp_min: f64,

    /// Upper bound of the acceptable temperature band
    #[serde(default = "default_temp_max")]
    pub temp_max: f64,

    /// At or below this temperature a single sample is freeze-critical
    #[serde(default = "default_freeze_alert_threshold")]
    pub freeze_alert_threshold: f64,

    /// Battery percentage below which a low-battery alert fires
    #[serde(default = "default_battery_low_threshold")]
    pub battery_low_threshold: f64,

    /// Battery percentage below which the alert escalates to critical
    #[serde(default = "default_battery_critical_threshold")]
    pub battery_critical_threshold: f64,

    /// Lower bound of the acceptable humidity band
    #[serde(default = "default_humidity_min")]
    pub humidity_min: f64,

    /// Upper bound of the acceptable humidity band
    #[serde(default = "default_humidity_max")]
    pub humidity_max: f64,

    /// Trailing window span for freeze-damage scoring, in seconds
    #[serde(default = "default_window_span_secs")]
    pub window_span_secs: i64,

    /// Maximum timestamp gap joining two points into one freeze run
    ///
    /// A gap larger than this is treated as a connectivity gap, not a
    /// continuous freeze event.
    #[serde(default = "default_max_sample_gap_secs")]
    pub max_sample_gap_secs: i64,

    /// Excursion depth (degrees C below threshold) saturating depth_score at 1.0
    #[serde(default = "default_depth_sat")]
    pub depth_sat: f64,

    /// Run duration (seconds) saturating duration_score at 1.0
    #[serde(default = "default_duration_sat_secs")]
    pub duration_sat_secs: f64,

    /// Run count saturating frequency_score at 1.0
    #[serde(default = "default_frequency_sat")]
    pub frequency_sat: u32,

    /// Composite score at or above which FREEZE_SCORE_SEVERE fires
    #[serde(default = "default_freeze_score_severe_threshold")]
    pub freeze_score_severe_threshold: f64,

    /// Maximum accepted age of a reading's timestamp, in seconds
    #[serde(default = "default_max_skew_past_secs")]
    pub max_skew_past_secs: i64,

    /// Maximum accepted clock-ahead skew of a reading's timestamp, in seconds
    #[serde(default = "default_max_skew_future_secs")]
    pub max_skew_future_secs: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temp_min: default_temp_min(),
            temp_max: default_temp_max(),
            freeze_alert_threshold: default_freeze_alert_threshold(),
            battery_low_threshold: default_battery_low_threshold(),
            battery_critical_threshold: default_battery_critical_threshold(),
            humidity_min: default_humidity_min(),
            humidity_max: default_humidity_max(),
            window_span_secs: default_window_span_secs(),
            max_sample_gap_secs: default_max_sample_gap_secs(),
            depth_sat: default_depth_sat(),
            duration_sat_secs: default_duration_sat_secs(),
            frequency_sat: default_frequency_sat(),
            freeze_score_severe_threshold: default_freeze_score_severe_threshold(),
            max_skew_past_secs: default_max_skew_past_secs(),
            max_skew_future_secs: default_max_skew_future_secs(),
        }
    }
}

// Default value functions
fn default_temp_min() -> f64 {
    2.0
}

fn default_temp_max() -> f64 {
    8.0
}

fn default_freeze_alert_threshold() -> f64 {
    0.0
}

fn default_battery_low_threshold() -> f64 {
    20.0
}

fn default_battery_critical_threshold() -> f64 {
    10.0
}

fn default_humidity_min() -> f64 {
    30.0
}

fn default_humidity_max() -> f64 {
    80.0
}

fn default_window_span_secs() -> i64 {
    86_400
}

fn default_max_sample_gap_secs() -> i64 {
    // 2x the expected 60s device sampling interval
    120
}

fn default_depth_sat() -> f64 {
    5.0
}

fn default_duration_sat_secs() -> f64 {
    3600.0
}

fn default_frequency_sat() -> u32 {
    10
}

fn default_freeze_score_severe_threshold() -> f64 {
    0.6
}

fn default_max_skew_past_secs() -> i64 {
    86_400
}

fn default_max_skew_future_secs() -> i64 {
    300
}
