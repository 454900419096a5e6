// src/service/alert_engine.rs
//! One evaluation pass: read settings and offers, generate alerts.
//!
//! The engine holds its collaborators explicitly; there is no global
//! state. A pass reads the clock once and never fails.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::model::alert::DeadlineAlert;
use crate::domain::model::settings::AlertSettings;
use crate::repository::kv_store::KeyValueStore;
use crate::repository::offer_store::OfferStore;
use crate::repository::settings_store::SettingsStore;
use crate::service::alert_generator::{AlertGenerator, EngineOptions};
use crate::service::diagnostics::DiagnosticSink;
use crate::telemetry::metrics::{ALERTS_ACTIVE, ALERTS_EMITTED, ALERT_CYCLES};

pub struct AlertEngine {
    offers: OfferStore,
    settings: SettingsStore,
    generator: AlertGenerator,
}

impl AlertEngine {
    pub fn new(offers: OfferStore, settings: SettingsStore, generator: AlertGenerator) -> Self {
        Self {
            offers,
            settings,
            generator,
        }
    }

    /// Wires both stores onto one key/value backend.
    pub fn from_store(
        kv: Arc<dyn KeyValueStore>,
        options: EngineOptions,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self::new(
            OfferStore::new(kv.clone()),
            SettingsStore::new(kv, diagnostics.clone()),
            AlertGenerator::new(options, diagnostics),
        )
    }

    pub fn offer_store(&self) -> &OfferStore {
        &self.offers
    }

    pub fn settings_store(&self) -> &SettingsStore {
        &self.settings
    }

    pub async fn current_settings(&self) -> AlertSettings {
        self.settings.load_settings().await
    }

    pub async fn evaluate(&self) -> Vec<DeadlineAlert> {
        self.evaluate_at(Utc::now()).await
    }

    pub async fn evaluate_at(&self, now: DateTime<Utc>) -> Vec<DeadlineAlert> {
        let settings = self.settings.load_settings().await;
        let snapshot = self.offers.load_offers().await;
        let alerts = self.generator.generate_from(snapshot, &settings, now);

        metrics::increment_counter!(ALERT_CYCLES);
        metrics::counter!(ALERTS_EMITTED, alerts.len() as u64);
        metrics::gauge!(ALERTS_ACTIVE, alerts.len() as f64);
        debug!(
            alerts = alerts.len(),
            montage_alert_hours = settings.montage_alert_hours,
            depot_alert_hours = settings.depot_alert_hours,
            "evaluation pass complete"
        );
        alerts
    }
}
