//! Alert dispatch
//!
//! Forwards triggered alerts to the external notification collaborator.
//! Within one pipeline invocation a `(device_id, kind)` pair is forwarded at
//! most once, and each event gets exactly one delivery attempt; retry policy
//! belongs to whoever owns redelivery of the reading itself.

use crate::error::DispatchError;
use async_trait::async_trait;
use coldtrack_model::{AlertEvent, AlertKind};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Notification collaborator
///
/// The only capability the core needs from the notification layer. Real
/// implementations push to SNS, webhooks, or a message queue; the provided
/// implementations log or record in memory.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Deliver one alert; errors are reported to the dispatcher, not retried
    async fn send(&self, event: &AlertEvent) -> anyhow::Result<()>;
}

/// Deduplicating alert forwarder
pub struct AlertDispatcher<N: Notifier> {
    notifier: Arc<N>,
}

impl<N: Notifier> AlertDispatcher<N> {
    /// Create a dispatcher over the given notifier
    pub fn new(notifier: Arc<N>) -> Self {
        Self { notifier }
    }

    /// Forward the given events, deduplicated by `(device_id, kind)`
    ///
    /// Every deduplicated event gets exactly one send attempt even when an
    /// earlier one fails; failures are collected and surfaced, never
    /// swallowed.
    pub async fn dispatch(&self, events: &[AlertEvent]) -> Result<(), DispatchError> {
        let mut seen: HashSet<(String, AlertKind)> = HashSet::new();
        let mut attempted = 0usize;
        let mut failed = 0usize;
        let mut first_error: Option<String> = None;

        for event in events {
            if !seen.insert((event.device_id.clone(), event.kind)) {
                debug!(
                    device_id = %event.device_id,
                    kind = %event.kind,
                    "Duplicate alert kind suppressed within invocation"
                );
                continue;
            }

            attempted += 1;
            if let Err(e) = self.notifier.send(event).await {
                warn!(
                    device_id = %event.device_id,
                    kind = %event.kind,
                    error = %e,
                    "Alert delivery failed"
                );
                failed += 1;
                first_error.get_or_insert_with(|| e.to_string());
            }
        }

        match first_error {
            None => Ok(()),
            Some(first_error) => Err(DispatchError::Delivery {
                attempted,
                failed,
                first_error,
            }),
        }
    }
}

// ============================================================================
// Notifier implementations
// ============================================================================

/// Notifier that emits alerts through tracing
///
/// Default sink for deployments where the actual notification channel is
/// wired up out-of-process (log shipper, journald, etc).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, event: &AlertEvent) -> anyhow::Result<()> {
        warn!(
            device_id = %event.device_id,
            kind = %event.kind,
            severity = event.severity,
            triggering_timestamp = event.triggering_timestamp,
            "ALERT"
        );
        Ok(())
    }
}

/// In-memory notifier for tests
///
/// Records every delivered event; can be flipped into a failing mode to
/// exercise dispatch error paths.
#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<AlertEvent>>,
    failing: Mutex<bool>,
}

impl MemoryNotifier {
    /// Create a new recording notifier
    pub fn new() -> Self {
        Self::default()
    }

    /// All events delivered so far
    pub fn sent(&self) -> Vec<AlertEvent> {
        self.sent.lock().clone()
    }

    /// Make every subsequent send fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, event: &AlertEvent) -> anyhow::Result<()> {
        if *self.failing.lock() {
            anyhow::bail!("notification channel unavailable");
        }
        self.sent.lock().push(event.clone());
        Ok(())
    }
}
