//! Per-reading processing pipeline
//!
//! One `Pipeline` instance is shared across concurrent invocations; all
//! state lives in the store, so there is no cross-reading coordination here.
//! Stage sequence per reading:
//! received -> validated -> persisted -> evaluated -> (alerted | clean)
//! with only the persistence write eligible for local retry.

use crate::error::PipelineError;
use coldtrack_model::{
    validate, AlertEvent, PipelineConfig, Reading, StoredPoint, SystemTimeProvider, TimeProvider,
};
use coldtrack_rules::{thresholds, AlertDispatcher, FreezeScorer, Notifier};
use coldtrack_store::{StoreError, TelemetryStore, WriteOutcome};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Persistence write attempts per reading (immediate, no backoff; the
/// transport layer owns redelivery timing)
const WRITE_ATTEMPTS: u32 = 2;

/// Structured result of one successful pipeline invocation
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingReport {
    pub device_id: String,

    /// Timestamp of the processed reading, epoch seconds
    pub timestamp: i64,

    /// Whether this invocation stored a new point or replayed an existing one
    pub outcome: WriteOutcome,

    /// Alerts fired by this reading, already forwarded to the notifier
    pub alerts: Vec<AlertEvent>,

    /// True when the freeze-damage score could not be computed because the
    /// history query failed; threshold alerts still apply
    pub scoring_skipped: bool,
}

/// Telemetry processing pipeline
///
/// Generic over the storage backend, the notification collaborator, and the
/// clock so tests can pin all three.
pub struct Pipeline<S: TelemetryStore, N: Notifier, T: TimeProvider = SystemTimeProvider> {
    store: Arc<S>,
    scorer: FreezeScorer<S>,
    dispatcher: AlertDispatcher<N>,
    config: PipelineConfig,
    time: T,
}

impl<S: TelemetryStore, N: Notifier> Pipeline<S, N, SystemTimeProvider> {
    /// Create a pipeline using the system clock
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: PipelineConfig) -> Self {
        Self::with_time_provider(store, notifier, config, SystemTimeProvider)
    }
}

impl<S: TelemetryStore, N: Notifier, T: TimeProvider> Pipeline<S, N, T> {
    /// Create a pipeline with an explicit time provider
    pub fn with_time_provider(
        store: Arc<S>,
        notifier: Arc<N>,
        config: PipelineConfig,
        time: T,
    ) -> Self {
        Self {
            scorer: FreezeScorer::new(Arc::clone(&store)),
            dispatcher: AlertDispatcher::new(notifier),
            store,
            config,
            time,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one raw inbound reading
    ///
    /// Validation failures surface verbatim with no side effects. A
    /// duplicate write outcome is not an error: the reading is re-evaluated
    /// so a redelivery can still raise an alert a crashed invocation missed.
    pub async fn process(&self, raw: &Value) -> Result<ProcessingReport, PipelineError> {
        let now = self.time.now_secs();
        let reading = validate(raw, now, &self.config)?;

        let outcome = self.write_with_retry(&reading.to_point()).await?;
        debug!(
            device_id = %reading.device_id,
            timestamp = reading.timestamp,
            ?outcome,
            "Reading persisted"
        );

        let (alerts, scoring_skipped) = self.evaluate(&reading).await;

        self.dispatcher.dispatch(&alerts).await?;

        if !alerts.is_empty() {
            info!(
                device_id = %reading.device_id,
                timestamp = reading.timestamp,
                alert_count = alerts.len(),
                "Alerts forwarded"
            );
        }

        Ok(ProcessingReport {
            device_id: reading.device_id,
            timestamp: reading.timestamp,
            outcome,
            alerts,
            scoring_skipped,
        })
    }

    /// Persist with bounded immediate retry
    async fn write_with_retry(&self, point: &StoredPoint) -> Result<WriteOutcome, PipelineError> {
        let mut last_error: Option<StoreError> = None;

        for attempt in 1..=WRITE_ATTEMPTS {
            match self.store.insert_point(point).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    warn!(
                        device_id = %point.device_id,
                        attempt,
                        error = %e,
                        "Persistence write failed"
                    );
                    last_error = Some(e);
                },
            }
        }

        Err(PipelineError::Persistence {
            attempts: WRITE_ATTEMPTS,
            source: last_error.unwrap_or(StoreError::ConnectionError(
                "write failed with no recorded error".to_string(),
            )),
        })
    }

    /// Threshold checks plus the freeze-damage score
    ///
    /// The threshold evaluator is pure and always applies; a failing history
    /// query only drops the scorer's contribution.
    async fn evaluate(&self, reading: &Reading) -> (Vec<AlertEvent>, bool) {
        let mut alerts = thresholds::evaluate(reading, &self.config);

        match self.scorer.evaluate(reading, &self.config).await {
            Ok(Some(event)) => {
                alerts.push(event);
                (alerts, false)
            },
            Ok(None) => (alerts, false),
            Err(e) => {
                warn!(
                    device_id = %reading.device_id,
                    error = %e,
                    "Freeze scoring skipped: history query failed"
                );
                (alerts, true)
            },
        }
    }
}
