// src/service/diagnostics.rs
//! Diagnostic sinks.
//!
//! The engine never returns errors to alert consumers. Anything it absorbs
//! (unreadable collection, skipped record, bad date, corrupt settings) is
//! reported here instead, so failures stay observable in logs and in tests.

use std::sync::{Arc, Mutex};

use crate::domain::error::{AlertingError, ErrorImpact};
use crate::telemetry::metrics::ALERT_DIAGNOSTICS;

/// Receives every failure the engine absorbs.
pub trait DiagnosticSink: Send + Sync + 'static {
    fn report(&self, error: &AlertingError);
}

/// Default sink: one structured `warn` event per diagnostic plus a counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnosticSink;

impl DiagnosticSink for TracingDiagnosticSink {
    fn report(&self, error: &AlertingError) {
        let ctx = error.context();
        tracing::warn!(
            kind = error.kind(),
            impact = ?error.impact(),
            offer_id = ?ctx.offer_id,
            field = ctx.field.as_deref().unwrap_or("<none>"),
            storage_key = ctx.storage_key.as_deref().unwrap_or("<none>"),
            error = %error,
            "alert engine diagnostic"
        );
        metrics::increment_counter!(ALERT_DIAGNOSTICS, "kind" => error.kind());
    }
}

/// A diagnostic captured by [`RecordingDiagnosticSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDiagnostic {
    pub kind: &'static str,
    pub impact: ErrorImpact,
    pub offer_id: Option<i64>,
    pub message: String,
}

/// Keeps diagnostics in memory; used by tests and by hosts that surface them.
#[derive(Debug, Default, Clone)]
pub struct RecordingDiagnosticSink {
    entries: Arc<Mutex<Vec<RecordedDiagnostic>>>,
}

impl RecordingDiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RecordedDiagnostic> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.entries().into_iter().map(|d| d.kind).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut e) = self.entries.lock() {
            e.clear();
        }
    }
}

impl DiagnosticSink for RecordingDiagnosticSink {
    fn report(&self, error: &AlertingError) {
        if let Ok(mut e) = self.entries.lock() {
            e.push(RecordedDiagnostic {
                kind: error.kind(),
                impact: error.impact(),
                offer_id: error.context().offer_id,
                message: error.to_string(),
            });
        }
    }
}
