//! Telemetry generator
//!
//! Produces raw JSON payloads the way the device firmware would publish
//! them: a base temperature inside the configured band with random
//! variation, a slowly draining battery, GPS jitter around a fixed depot
//! position, and the occasional injected freeze excursion for exercising the
//! alert path.

use crate::config::SimConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

/// Depot position the simulated truck circles (central London)
const BASE_LATITUDE: f64 = 51.5074;
const BASE_LONGITUDE: f64 = -0.1278;

/// Stateful payload generator for one simulated device
pub struct Simulator {
    config: SimConfig,
    battery_level: f64,
    sequence: i64,
    rng: StdRng,
}

impl Simulator {
    /// Create a generator from configuration, seeded from the OS
    pub fn new(config: SimConfig) -> Self {
        let battery_level = config.battery_initial;
        Self {
            config,
            battery_level,
            sequence: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a deterministic generator for tests
    pub fn with_seed(config: SimConfig, seed: u64) -> Self {
        let battery_level = config.battery_initial;
        Self {
            config,
            battery_level,
            sequence: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate the next raw payload
    ///
    /// Returns the JSON payload and whether a freeze excursion was injected
    /// into this sample.
    pub fn generate(&mut self, now_secs: i64) -> (Value, bool) {
        let cfg = &self.config;

        let base = self.rng.gen_range(cfg.temp_range[0]..=cfg.temp_range[1]);
        let mut temperature =
            base + self.rng.gen_range(-cfg.temp_variation..=cfg.temp_variation);

        let freeze_event = self.rng.gen_bool(cfg.freeze_event_chance.clamp(0.0, 1.0));
        if freeze_event {
            temperature = self.rng.gen_range(-2.0..=1.0);
        }

        let humidity = (self
            .rng
            .gen_range(cfg.humidity_range[0]..=cfg.humidity_range[1])
            + self
                .rng
                .gen_range(-cfg.humidity_variation..=cfg.humidity_variation))
        .clamp(0.0, 100.0);

        self.battery_level = (self.battery_level - cfg.battery_drain_rate).max(0.0);

        self.sequence += 1;
        let message_id = now_secs * 1000 + self.sequence % 1000;

        let payload = json!({
            "device_id": cfg.device_id,
            "temperature": round2(temperature),
            "humidity": round2(humidity),
            "battery": round2(self.battery_level),
            "timestamp": now_secs,
            "latitude": BASE_LATITUDE + self.rng.gen_range(-0.01..=0.01),
            "longitude": BASE_LONGITUDE + self.rng.gen_range(-0.01..=0.01),
            "rssi": self.rng.gen_range(-90..=-50),
            "message_id": message_id,
        });

        (payload, freeze_event)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
