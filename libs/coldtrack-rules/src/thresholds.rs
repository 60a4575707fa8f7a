//! Per-reading threshold evaluation
//!
//! Stateless rule checks against configured bounds. Pure: no I/O, no clock,
//! the same reading and configuration always produce the same alerts.
//!
//! Boundary semantics: equality with `temp_min`/`temp_max` (and the humidity
//! band edges) does NOT trigger; the freeze check uses `<=` because freezing
//! at exactly the threshold is itself damaging.

use coldtrack_model::{AlertEvent, AlertKind, PipelineConfig, Reading};

/// Severity for a low-battery warning (critical is always 1.0)
const BATTERY_LOW_SEVERITY: f64 = 0.5;

/// Severity for a humidity band violation
const HUMIDITY_SEVERITY: f64 = 0.2;

/// Evaluate one reading against the configured thresholds
///
/// Returns every alert the reading triggers; the set may be empty. A reading
/// below both `temp_min` and the freeze threshold yields both
/// `OUT_OF_RANGE_LOW` and `FREEZE_CRITICAL` (distinct kinds), matching the
/// dispatcher's dedup key.
pub fn evaluate(reading: &Reading, config: &PipelineConfig) -> Vec<AlertEvent> {
    let mut alerts = Vec::new();
    let span = config.temp_max - config.temp_min;

    if reading.temperature > config.temp_max {
        let severity = clamp_unit((reading.temperature - config.temp_max) / span);
        alerts.push(
            AlertEvent::new(
                AlertKind::OutOfRangeHigh,
                severity,
                &reading.device_id,
                reading.timestamp,
            )
            .with_detail("temperature", reading.temperature)
            .with_detail("temp_max", config.temp_max),
        );
    }

    if reading.temperature < config.temp_min {
        let severity = clamp_unit((config.temp_min - reading.temperature) / span);
        alerts.push(
            AlertEvent::new(
                AlertKind::OutOfRangeLow,
                severity,
                &reading.device_id,
                reading.timestamp,
            )
            .with_detail("temperature", reading.temperature)
            .with_detail("temp_min", config.temp_min),
        );
    }

    // Freezing is always maximum single-sample severity, regardless of the
    // configured range.
    if reading.temperature <= config.freeze_alert_threshold {
        alerts.push(
            AlertEvent::new(
                AlertKind::FreezeCritical,
                1.0,
                &reading.device_id,
                reading.timestamp,
            )
            .with_detail("temperature", reading.temperature)
            .with_detail("freeze_threshold", config.freeze_alert_threshold),
        );
    }

    if let Some(battery) = reading.battery {
        // Critical supersedes low
        if battery < config.battery_critical_threshold {
            alerts.push(
                AlertEvent::new(
                    AlertKind::BatteryCritical,
                    1.0,
                    &reading.device_id,
                    reading.timestamp,
                )
                .with_detail("battery", battery),
            );
        } else if battery < config.battery_low_threshold {
            alerts.push(
                AlertEvent::new(
                    AlertKind::BatteryLow,
                    BATTERY_LOW_SEVERITY,
                    &reading.device_id,
                    reading.timestamp,
                )
                .with_detail("battery", battery),
            );
        }
    }

    if let Some(humidity) = reading.humidity {
        if humidity < config.humidity_min || humidity > config.humidity_max {
            alerts.push(
                AlertEvent::new(
                    AlertKind::HumidityOutOfRange,
                    HUMIDITY_SEVERITY,
                    &reading.device_id,
                    reading.timestamp,
                )
                .with_detail("humidity", humidity),
            );
        }
    }

    alerts
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
