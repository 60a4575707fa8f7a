//! End-to-end pipeline scenarios
//!
//! Exercises the full validate -> persist -> evaluate -> dispatch sequence
//! against the in-memory store, including redelivery, out-of-order arrival,
//! degraded scoring, and the cold-chain excursion scenarios.

// Allow unwrap() in tests for cleaner test code
#![allow(clippy::disallowed_methods)]

use async_trait::async_trait;
use coldtrack_model::{AlertKind, FixedTimeProvider, PipelineConfig, StoredPoint};
use coldtrack_pipeline::{Pipeline, PipelineError, PipelineStage};
use coldtrack_rules::MemoryNotifier;
use coldtrack_store::{MemoryStore, StoreError, TelemetryStore, WriteOutcome};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

const NOW: i64 = 1_700_000_000;

fn payload(device: &str, ts: i64, temp: f64) -> Value {
    json!({
        "device_id": device,
        "timestamp": ts,
        "temperature": temp,
        "message_id": ts,
    })
}

fn test_pipeline(
    store: Arc<MemoryStore>,
    notifier: Arc<MemoryNotifier>,
) -> Pipeline<MemoryStore, MemoryNotifier, FixedTimeProvider> {
    Pipeline::with_time_provider(
        store,
        notifier,
        PipelineConfig::default(),
        FixedTimeProvider::new(NOW),
    )
}

fn kinds(report: &coldtrack_pipeline::ProcessingReport) -> Vec<AlertKind> {
    report.alerts.iter().map(|a| a.kind).collect()
}

// ============================================================================
// Idempotency and ordering
// ============================================================================

#[tokio::test]
async fn test_idempotent_replay() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let pipeline = test_pipeline(Arc::clone(&store), notifier);

    let raw = payload("CT-001", NOW - 60, 4.5);

    let first = pipeline.process(&raw).await.unwrap();
    assert_eq!(first.outcome, WriteOutcome::Inserted);

    let second = pipeline.process(&raw).await.unwrap();
    assert_eq!(second.outcome, WriteOutcome::DuplicateIgnored);

    // The stored point after both calls is identical to after one call
    assert_eq!(store.point_count("CT-001").await.unwrap(), 1);
    let points = store.query_window("CT-001", 0, NOW).await.unwrap();
    assert_eq!(points[0].temperature, 4.5);
}

#[tokio::test]
async fn test_arrival_order_does_not_change_stored_set() {
    let stamps = [NOW - 100, NOW - 400, NOW - 200, NOW - 300, NOW - 500];

    let mut stored_sets = Vec::new();
    for permutation in [
        [0usize, 1, 2, 3, 4],
        [4, 3, 2, 1, 0],
        [2, 0, 4, 1, 3],
    ] {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(MemoryNotifier::new());
        let pipeline = test_pipeline(Arc::clone(&store), notifier);

        for &i in &permutation {
            pipeline
                .process(&payload("CT-001", stamps[i], 4.0))
                .await
                .unwrap();
        }

        let mut points = store.query_window("CT-001", 0, NOW).await.unwrap();
        points.sort_by_key(|p| p.timestamp);
        stored_sets.push(points);
    }

    assert_eq!(stored_sets[0], stored_sets[1]);
    assert_eq!(stored_sets[0], stored_sets[2]);
    assert_eq!(stored_sets[0].len(), 5);
}

// ============================================================================
// Validation failures
// ============================================================================

#[tokio::test]
async fn test_validation_failure_has_no_side_effects() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let pipeline = test_pipeline(Arc::clone(&store), Arc::clone(&notifier));

    let raw = json!({"timestamp": NOW, "temperature": 4.0}); // no device_id
    let err = pipeline.process(&raw).await.unwrap_err();

    assert_eq!(err.stage(), PipelineStage::Validate);
    assert!(!err.is_retryable());
    assert_eq!(store.device_count(), 0);
    assert!(notifier.sent().is_empty());
}

// ============================================================================
// Scenario A: single short freeze run
// ============================================================================

#[tokio::test]
async fn test_scenario_single_short_excursion() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let pipeline = test_pipeline(Arc::clone(&store), Arc::clone(&notifier));

    let base = NOW - 600;
    let temps = [2.0, 1.0, -1.0, -0.5, 3.0];

    let mut reports = Vec::new();
    for (i, &temp) in temps.iter().enumerate() {
        let raw = payload("CT-001", base + i as i64 * 60, temp);
        reports.push(pipeline.process(&raw).await.unwrap());
    }

    // 2.0C: clean (equality with temp_min does not trigger)
    assert!(reports[0].alerts.is_empty());
    // 1.0C: below range only
    assert_eq!(kinds(&reports[1]), vec![AlertKind::OutOfRangeLow]);
    // -1.0C: below range and freeze-critical
    assert_eq!(
        kinds(&reports[2]),
        vec![AlertKind::OutOfRangeLow, AlertKind::FreezeCritical]
    );
    let freeze = &reports[2].alerts[1];
    assert_eq!(freeze.severity, 1.0);
    // 3.0C recovery: clean again
    assert!(reports[4].alerts.is_empty());

    // A single short run never reaches FREEZE_SCORE_SEVERE with defaults
    for report in &reports {
        assert!(!report.alerts.iter().any(|a| a.kind == AlertKind::FreezeScoreSevere));
        assert!(!report.scoring_skipped);
    }
}

// ============================================================================
// Scenario B: repeated excursions saturate the frequency dimension
// ============================================================================

#[tokio::test]
async fn test_scenario_repeated_excursions_fire_severe_score() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let pipeline = test_pipeline(Arc::clone(&store), Arc::clone(&notifier));

    // Seed 9 historical runs over the last 24h (depth 3C, duration 600s,
    // separated well beyond the sample gap), as if processed earlier.
    let day_start = NOW - 86_000;
    for run in 0..9i64 {
        let run_start = day_start + run * 7200;
        for sample in 0..11i64 {
            let ts = run_start + sample * 60;
            store
                .insert_point(&StoredPoint {
                    device_id: "CT-001".to_string(),
                    idempotency_key: ts,
                    timestamp: ts,
                    temperature: -3.0,
                    humidity: None,
                    battery: None,
                    latitude: None,
                    longitude: None,
                    rssi: None,
                })
                .await
                .unwrap();
        }
    }

    // The 10th excursion arrives through the pipeline
    let report = pipeline
        .process(&payload("CT-001", NOW - 60, -3.0))
        .await
        .unwrap();

    let severe: Vec<_> = report
        .alerts
        .iter()
        .filter(|a| a.kind == AlertKind::FreezeScoreSevere)
        .collect();
    assert_eq!(severe.len(), 1);
    assert!(severe[0].severity >= 0.6);
    assert_eq!(
        severe[0].details["frequency_score"],
        serde_json::Value::from(1.0)
    );

    // And it reached the notifier exactly once
    let sent_severe = notifier
        .sent()
        .iter()
        .filter(|a| a.kind == AlertKind::FreezeScoreSevere)
        .count();
    assert_eq!(sent_severe, 1);
}

// ============================================================================
// Scenario C: redelivery after a crash between persist and evaluate
// ============================================================================

#[tokio::test]
async fn test_scenario_redelivery_recovers_missed_alert() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let pipeline = test_pipeline(Arc::clone(&store), Arc::clone(&notifier));

    // A previous invocation persisted the point, then crashed before
    // evaluation: the point exists but no alert was ever sent.
    let ts = NOW - 120;
    store
        .insert_point(&StoredPoint {
            device_id: "CT-001".to_string(),
            idempotency_key: ts,
            timestamp: ts,
            temperature: -2.0,
            humidity: None,
            battery: None,
            latitude: None,
            longitude: None,
            rssi: None,
        })
        .await
        .unwrap();
    assert!(notifier.sent().is_empty());

    // The transport redelivers the same message
    let report = pipeline.process(&payload("CT-001", ts, -2.0)).await.unwrap();

    assert_eq!(report.outcome, WriteOutcome::DuplicateIgnored);
    assert!(report.alerts.iter().any(|a| a.kind == AlertKind::FreezeCritical));
    assert!(notifier
        .sent()
        .iter()
        .any(|a| a.kind == AlertKind::FreezeCritical));
    // No duplicate stored point
    assert_eq!(store.point_count("CT-001").await.unwrap(), 1);
}

// ============================================================================
// Failure injection: retry and degraded scoring
// ============================================================================

/// Store wrapper that fails a configurable number of inserts and optionally
/// all window queries
struct FlakyStore {
    inner: MemoryStore,
    insert_failures_left: Mutex<u32>,
    fail_queries: Mutex<bool>,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            insert_failures_left: Mutex::new(0),
            fail_queries: Mutex::new(false),
        }
    }

    fn fail_next_inserts(&self, count: u32) {
        *self.insert_failures_left.lock() = count;
    }

    fn set_fail_queries(&self, fail: bool) {
        *self.fail_queries.lock() = fail;
    }
}

#[async_trait]
impl TelemetryStore for FlakyStore {
    async fn insert_point(&self, point: &StoredPoint) -> coldtrack_store::Result<WriteOutcome> {
        {
            let mut left = self.insert_failures_left.lock();
            if *left > 0 {
                *left -= 1;
                return Err(StoreError::ConnectionError("injected".to_string()));
            }
        }
        self.inner.insert_point(point).await
    }

    async fn query_window(
        &self,
        device_id: &str,
        since: i64,
        until: i64,
    ) -> coldtrack_store::Result<Vec<StoredPoint>> {
        if *self.fail_queries.lock() {
            return Err(StoreError::ConnectionError("injected".to_string()));
        }
        self.inner.query_window(device_id, since, until).await
    }

    async fn point_count(&self, device_id: &str) -> coldtrack_store::Result<u64> {
        self.inner.point_count(device_id).await
    }
}

#[tokio::test]
async fn test_persistence_retry_recovers_single_failure() {
    let store = Arc::new(FlakyStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let pipeline = Pipeline::with_time_provider(
        Arc::clone(&store),
        notifier,
        PipelineConfig::default(),
        FixedTimeProvider::new(NOW),
    );

    store.fail_next_inserts(1);
    let report = pipeline
        .process(&payload("CT-001", NOW - 60, 4.0))
        .await
        .unwrap();
    assert_eq!(report.outcome, WriteOutcome::Inserted);
}

#[tokio::test]
async fn test_persistence_exhausted_retries_surface() {
    let store = Arc::new(FlakyStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let pipeline = Pipeline::with_time_provider(
        Arc::clone(&store),
        notifier,
        PipelineConfig::default(),
        FixedTimeProvider::new(NOW),
    );

    store.fail_next_inserts(2);
    let err = pipeline
        .process(&payload("CT-001", NOW - 60, 4.0))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), PipelineStage::Persist);
    assert!(err.is_retryable());

    // The transport redelivers; the store has recovered
    let report = pipeline
        .process(&payload("CT-001", NOW - 60, 4.0))
        .await
        .unwrap();
    assert_eq!(report.outcome, WriteOutcome::Inserted);
}

#[tokio::test]
async fn test_scoring_degrades_when_history_unavailable() {
    let store = Arc::new(FlakyStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let pipeline = Pipeline::with_time_provider(
        Arc::clone(&store),
        Arc::clone(&notifier),
        PipelineConfig::default(),
        FixedTimeProvider::new(NOW),
    );

    store.set_fail_queries(true);
    let report = pipeline
        .process(&payload("CT-001", NOW - 60, -2.0))
        .await
        .unwrap();

    // Threshold alerts (pure, no I/O) still apply
    assert!(report.scoring_skipped);
    assert!(report.alerts.iter().any(|a| a.kind == AlertKind::FreezeCritical));
    assert!(!notifier.sent().is_empty());
}

#[tokio::test]
async fn test_dispatch_failure_surfaces_after_persist() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let pipeline = test_pipeline(Arc::clone(&store), Arc::clone(&notifier));

    notifier.set_failing(true);
    let err = pipeline
        .process(&payload("CT-001", NOW - 60, -2.0))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), PipelineStage::Dispatch);
    // Persistence already committed before dispatch failed
    assert_eq!(store.point_count("CT-001").await.unwrap(), 1);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_redelivery_single_insert() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let pipeline = Arc::new(test_pipeline(Arc::clone(&store), notifier));

    let raw = payload("CT-001", NOW - 60, 4.0);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let pipeline = Arc::clone(&pipeline);
        let raw = raw.clone();
        handles.push(tokio::spawn(async move {
            pipeline.process(&raw).await.unwrap().outcome
        }));
    }

    let mut inserted = 0;
    for handle in handles {
        if handle.await.unwrap() == WriteOutcome::Inserted {
            inserted += 1;
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(store.point_count("CT-001").await.unwrap(), 1);
}
