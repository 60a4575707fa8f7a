//! Simulator configuration
//!
//! Loaded from an optional YAML/JSON file merged with `COLDSIM_`-prefixed
//! environment variables; every field has a default so the tool runs with no
//! configuration at all.

use anyhow::{Context, Result};
use coldtrack_model::PipelineConfig;
use figment::providers::{Env, Format, Json, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Device simulation parameters plus the pipeline thresholds to run against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Simulated device identifier
    #[serde(default = "default_device_id")]
    pub device_id: String,

    /// Seconds between samples (wall-clock sleep and timestamp spacing)
    #[serde(default = "default_publish_interval")]
    pub publish_interval_secs: u64,

    /// Base temperature range the payload normally sits in, degrees C
    #[serde(default = "default_temp_range")]
    pub temp_range: [f64; 2],

    /// Random variation added on top of the base temperature
    #[serde(default = "default_temp_variation")]
    pub temp_variation: f64,

    /// Base humidity range, percent
    #[serde(default = "default_humidity_range")]
    pub humidity_range: [f64; 2],

    /// Random variation added on top of the base humidity
    #[serde(default = "default_humidity_variation")]
    pub humidity_variation: f64,

    /// Battery charge at start, percent
    #[serde(default = "default_battery_initial")]
    pub battery_initial: f64,

    /// Battery drained per sample, percent
    #[serde(default = "default_battery_drain_rate")]
    pub battery_drain_rate: f64,

    /// Probability per sample of injecting a freeze excursion
    #[serde(default = "default_freeze_event_chance")]
    pub freeze_event_chance: f64,

    /// Thresholds and scoring constants for the pipeline under test
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl SimConfig {
    /// Load configuration from an optional file plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(path) = path {
            let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");
            figment = match extension {
                "json" => figment.merge(Json::file(path)),
                _ => figment.merge(Yaml::file(path)),
            };
        }

        figment
            .merge(Env::prefixed("COLDSIM_").split("__"))
            .extract()
            .context("Failed to load simulator configuration")
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            publish_interval_secs: default_publish_interval(),
            temp_range: default_temp_range(),
            temp_variation: default_temp_variation(),
            humidity_range: default_humidity_range(),
            humidity_variation: default_humidity_variation(),
            battery_initial: default_battery_initial(),
            battery_drain_rate: default_battery_drain_rate(),
            freeze_event_chance: default_freeze_event_chance(),
            pipeline: PipelineConfig::default(),
        }
    }
}

// Default value functions
fn default_device_id() -> String {
    "CT-001".to_string()
}

fn default_publish_interval() -> u64 {
    60
}

fn default_temp_range() -> [f64; 2] {
    [2.0, 8.0]
}

fn default_temp_variation() -> f64 {
    2.0
}

fn default_humidity_range() -> [f64; 2] {
    [50.0, 70.0]
}

fn default_humidity_variation() -> f64 {
    10.0
}

fn default_battery_initial() -> f64 {
    100.0
}

fn default_battery_drain_rate() -> f64 {
    0.001
}

fn default_freeze_event_chance() -> f64 {
    0.05
}
