//! Reading validation
//!
//! Pure conversion of a duck-typed inbound JSON payload into a strictly
//! typed [`Reading`]. No I/O, no side effects: the same payload, clock value,
//! and configuration always produce the same result.
//!
//! Checks short-circuit in this order: required fields present and typed,
//! device_id non-empty, timestamp within skew bounds, temperature finite and
//! within sanity bounds, optional percentages within [0, 100], optional
//! coordinates within their ranges.

use crate::config::PipelineConfig;
use crate::error::{Result, ValidationError};
use crate::types::Reading;
use serde_json::Value;

/// Physical sanity bounds for a refrigerated-transport temperature sensor
const TEMP_SANITY_MIN: f64 = -50.0;
const TEMP_SANITY_MAX: f64 = 60.0;

/// Validate and normalize a raw telemetry payload
///
/// # Arguments
/// * `raw` - Inbound payload as delivered by the transport layer
/// * `now_secs` - Current time in epoch seconds, supplied by the caller so
///   the function stays pure
/// * `config` - Skew bounds
///
/// # Returns
/// * `Ok(Reading)` - Validated, immutable reading
/// * `Err(ValidationError)` - First failed check, in documented order
pub fn validate(raw: &Value, now_secs: i64, config: &PipelineConfig) -> Result<Reading> {
    if !raw.is_object() {
        return Err(ValidationError::TypeMismatch {
            field: "payload",
            expected: "JSON object",
        });
    }

    // Required fields: presence and type first
    let device_id = require_str(raw, "device_id")?;
    let timestamp = require_i64(raw, "timestamp")?;
    let temperature = require_f64(raw, "temperature")?;

    // device_id semantics
    if device_id.is_empty() {
        return Err(ValidationError::InvalidDeviceId);
    }

    // Timestamp skew window
    let min = now_secs - config.max_skew_past_secs;
    let max = now_secs + config.max_skew_future_secs;
    if timestamp < min || timestamp > max {
        return Err(ValidationError::TimestampOutOfRange {
            timestamp,
            min,
            max,
        });
    }

    // Temperature sanity
    if !temperature.is_finite()
        || temperature < TEMP_SANITY_MIN
        || temperature > TEMP_SANITY_MAX
    {
        return Err(ValidationError::TemperatureOutOfSanityRange(temperature));
    }

    // Optional percentages
    let humidity = optional_percentage(raw, "humidity")?;
    let battery = optional_percentage(raw, "battery")?;

    // Optional GPS coordinates
    let latitude = optional_coordinate(raw, "latitude", 90.0)?;
    let longitude = optional_coordinate(raw, "longitude", 180.0)?;

    // Remaining optional fields
    let rssi = optional_i64(raw, "rssi")?;
    let message_id = optional_i64(raw, "message_id")?;

    Ok(Reading {
        device_id: device_id.to_string(),
        timestamp,
        temperature,
        humidity,
        battery,
        latitude,
        longitude,
        rssi,
        message_id,
    })
}

// ============================================================================
// Field extraction helpers
// ============================================================================

fn require_str<'a>(obj: &'a Value, field: &'static str) -> Result<&'a str> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(v) => v.as_str().ok_or(ValidationError::TypeMismatch {
            field,
            expected: "string",
        }),
    }
}

fn require_i64(obj: &Value, field: &'static str) -> Result<i64> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(v) => v.as_i64().ok_or(ValidationError::TypeMismatch {
            field,
            expected: "integer",
        }),
    }
}

fn require_f64(obj: &Value, field: &'static str) -> Result<f64> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(v) => v.as_f64().ok_or(ValidationError::TypeMismatch {
            field,
            expected: "number",
        }),
    }
}

fn optional_f64(obj: &Value, field: &'static str) -> Result<Option<f64>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or(ValidationError::TypeMismatch {
                field,
                expected: "number",
            }),
    }
}

fn optional_i64(obj: &Value, field: &'static str) -> Result<Option<i64>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or(ValidationError::TypeMismatch {
                field,
                expected: "integer",
            }),
    }
}

fn optional_percentage(obj: &Value, field: &'static str) -> Result<Option<f64>> {
    match optional_f64(obj, field)? {
        None => Ok(None),
        Some(value) => {
            if !(0.0..=100.0).contains(&value) {
                return Err(ValidationError::PercentageOutOfRange { field, value });
            }
            Ok(Some(value))
        },
    }
}

fn optional_coordinate(obj: &Value, field: &'static str, bound: f64) -> Result<Option<f64>> {
    match optional_f64(obj, field)? {
        None => Ok(None),
        Some(value) => {
            if !value.is_finite() || value < -bound || value > bound {
                return Err(ValidationError::CoordinateOutOfRange { field, value });
            }
            Ok(Some(value))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn payload() -> Value {
        json!({
            "device_id": "CT-001",
            "timestamp": NOW - 60,
            "temperature": 4.5,
        })
    }

    #[test]
    fn test_minimal_valid_payload() {
        let cfg = PipelineConfig::default();
        let reading = validate(&payload(), NOW, &cfg).unwrap();
        assert_eq!(reading.device_id, "CT-001");
        assert_eq!(reading.timestamp, NOW - 60);
        assert_eq!(reading.temperature, 4.5);
        assert_eq!(reading.humidity, None);
        assert_eq!(reading.message_id, None);
    }

    #[test]
    fn test_full_payload() {
        let cfg = PipelineConfig::default();
        let raw = json!({
            "device_id": "CT-001",
            "timestamp": NOW,
            "temperature": 4.5,
            "humidity": 55.2,
            "battery": 87.0,
            "latitude": 51.5074,
            "longitude": -0.1278,
            "rssi": -68,
            "message_id": 1700000000123_i64,
        });
        let reading = validate(&raw, NOW, &cfg).unwrap();
        assert_eq!(reading.humidity, Some(55.2));
        assert_eq!(reading.battery, Some(87.0));
        assert_eq!(reading.latitude, Some(51.5074));
        assert_eq!(reading.rssi, Some(-68));
        assert_eq!(reading.message_id, Some(1_700_000_000_123));
    }

    #[test]
    fn test_purity_same_input_same_output() {
        let cfg = PipelineConfig::default();
        let raw = payload();
        assert_eq!(validate(&raw, NOW, &cfg), validate(&raw, NOW, &cfg));
    }

    #[test]
    fn test_missing_required_fields() {
        let cfg = PipelineConfig::default();
        let raw = json!({"timestamp": NOW, "temperature": 4.0});
        assert_eq!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::MissingField("device_id"))
        );

        let raw = json!({"device_id": "CT-001", "temperature": 4.0});
        assert_eq!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::MissingField("timestamp"))
        );

        let raw = json!({"device_id": "CT-001", "timestamp": NOW});
        assert_eq!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::MissingField("temperature"))
        );
    }

    #[test]
    fn test_type_mismatches() {
        let cfg = PipelineConfig::default();
        let raw = json!({"device_id": 17, "timestamp": NOW, "temperature": 4.0});
        assert_eq!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::TypeMismatch {
                field: "device_id",
                expected: "string"
            })
        );

        // Fractional timestamp is not an integer
        let raw = json!({"device_id": "CT-001", "timestamp": 1.5, "temperature": 4.0});
        assert_eq!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::TypeMismatch {
                field: "timestamp",
                expected: "integer"
            })
        );

        let raw = json!({"device_id": "CT-001", "timestamp": NOW, "temperature": "cold"});
        assert_eq!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::TypeMismatch {
                field: "temperature",
                expected: "number"
            })
        );

        // NaN cannot transit JSON; it arrives as null and is rejected as missing
        let raw = json!({"device_id": "CT-001", "timestamp": NOW, "temperature": f64::NAN});
        assert_eq!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::MissingField("temperature"))
        );
    }

    #[test]
    fn test_non_object_payload() {
        let cfg = PipelineConfig::default();
        assert_eq!(
            validate(&json!([1, 2, 3]), NOW, &cfg),
            Err(ValidationError::TypeMismatch {
                field: "payload",
                expected: "JSON object"
            })
        );
    }

    #[test]
    fn test_empty_device_id() {
        let cfg = PipelineConfig::default();
        let raw = json!({"device_id": "", "timestamp": NOW, "temperature": 4.0});
        assert_eq!(validate(&raw, NOW, &cfg), Err(ValidationError::InvalidDeviceId));
    }

    #[test]
    fn test_timestamp_skew_bounds() {
        let cfg = PipelineConfig::default();

        // Exactly at the bounds is accepted
        let raw = json!({"device_id": "CT-001", "timestamp": NOW - 86_400, "temperature": 4.0});
        assert!(validate(&raw, NOW, &cfg).is_ok());
        let raw = json!({"device_id": "CT-001", "timestamp": NOW + 300, "temperature": 4.0});
        assert!(validate(&raw, NOW, &cfg).is_ok());

        // One second beyond either bound is rejected
        let raw = json!({"device_id": "CT-001", "timestamp": NOW - 86_401, "temperature": 4.0});
        assert!(matches!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::TimestampOutOfRange { .. })
        ));

        // 10 years in the future
        let raw = json!({
            "device_id": "CT-001",
            "timestamp": NOW + 10 * 365 * 86_400,
            "temperature": 4.0
        });
        assert!(matches!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::TimestampOutOfRange { .. })
        ));
    }

    #[test]
    fn test_temperature_sanity_bounds() {
        let cfg = PipelineConfig::default();
        let raw = json!({"device_id": "CT-001", "timestamp": NOW, "temperature": -50.1});
        assert_eq!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::TemperatureOutOfSanityRange(-50.1))
        );

        let raw = json!({"device_id": "CT-001", "timestamp": NOW, "temperature": 60.1});
        assert!(matches!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::TemperatureOutOfSanityRange(_))
        ));

        // Bounds themselves are sane
        let raw = json!({"device_id": "CT-001", "timestamp": NOW, "temperature": -50.0});
        assert!(validate(&raw, NOW, &cfg).is_ok());
        let raw = json!({"device_id": "CT-001", "timestamp": NOW, "temperature": 60.0});
        assert!(validate(&raw, NOW, &cfg).is_ok());
    }

    #[test]
    fn test_percentage_bounds() {
        let cfg = PipelineConfig::default();
        let raw = json!({
            "device_id": "CT-001", "timestamp": NOW, "temperature": 4.0,
            "battery": 101.0,
        });
        assert_eq!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::PercentageOutOfRange {
                field: "battery",
                value: 101.0
            })
        );

        let raw = json!({
            "device_id": "CT-001", "timestamp": NOW, "temperature": 4.0,
            "humidity": -0.5,
        });
        assert!(matches!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::PercentageOutOfRange { field: "humidity", .. })
        ));

        // 0 and 100 are valid
        let raw = json!({
            "device_id": "CT-001", "timestamp": NOW, "temperature": 4.0,
            "humidity": 0.0, "battery": 100.0,
        });
        assert!(validate(&raw, NOW, &cfg).is_ok());
    }

    #[test]
    fn test_coordinate_bounds() {
        let cfg = PipelineConfig::default();
        let raw = json!({
            "device_id": "CT-001", "timestamp": NOW, "temperature": 4.0,
            "latitude": 90.5,
        });
        assert!(matches!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::CoordinateOutOfRange { field: "latitude", .. })
        ));

        let raw = json!({
            "device_id": "CT-001", "timestamp": NOW, "temperature": 4.0,
            "longitude": -180.5,
        });
        assert!(matches!(
            validate(&raw, NOW, &cfg),
            Err(ValidationError::CoordinateOutOfRange { field: "longitude", .. })
        ));
    }

    #[test]
    fn test_check_order_short_circuits() {
        let cfg = PipelineConfig::default();
        // Both device_id and temperature are bad; device_id (typed first) wins
        let raw = json!({"device_id": "", "timestamp": NOW, "temperature": 999.0});
        assert_eq!(validate(&raw, NOW, &cfg), Err(ValidationError::InvalidDeviceId));
    }
}
