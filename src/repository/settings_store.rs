// src/repository/settings_store.rs
//! Alert settings persistence.
//!
//! `load_settings` always resolves to usable settings: absent, partial or
//! corrupt documents are replaced by defaults (and written back).
//! `save_settings` validates, persists and, through the key/value store,
//! announces the change so the scheduler re-evaluates.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tracing::info;

use crate::domain::error::{AlertingError, ErrorContext};
use crate::domain::model::settings::AlertSettings;
use crate::repository::kv_store::{ChangeOrigin, KeyValueStore, StorageEvent, ALERT_SETTINGS_KEY};
use crate::service::diagnostics::DiagnosticSink;
use crate::telemetry::metrics::SETTINGS_RESETS;

/// Result of reading the persisted document, before any repair.
#[derive(Debug)]
enum Stored {
    Missing,
    Valid(AlertSettings),
    /// Readable but incomplete; defaults filled the gaps.
    Completed(AlertSettings),
    Corrupt(AlertingError),
}

fn inspect(raw: Option<String>) -> Stored {
    let Some(raw) = raw else {
        return Stored::Missing;
    };
    let corrupt = |message: String| {
        Stored::Corrupt(AlertingError::CorruptSettings {
            message,
            context: ErrorContext::for_key(ALERT_SETTINGS_KEY),
        })
    };

    let value: JsonValue = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => return corrupt(e.to_string()),
    };
    let complete = ["montageAlertHours", "depotAlertHours", "timezone"]
        .iter()
        .all(|k| value.get(k).is_some());
    let settings: AlertSettings = match serde_json::from_value(value) {
        Ok(s) => s,
        Err(e) => return corrupt(e.to_string()),
    };
    if let Err(e) = settings.validate(ALERT_SETTINGS_KEY) {
        return corrupt(e.to_string());
    }
    if complete {
        Stored::Valid(settings)
    } else {
        Stored::Completed(settings)
    }
}

#[derive(Clone)]
pub struct SettingsStore {
    kv: Arc<dyn KeyValueStore>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl SettingsStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self { kv, diagnostics }
    }

    /// Persisted settings, or defaults. Never fails.
    pub async fn load_settings(&self) -> AlertSettings {
        let raw = match self.kv.get(ALERT_SETTINGS_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                self.diagnostics
                    .report(&AlertingError::storage(e, ALERT_SETTINGS_KEY));
                return AlertSettings::default();
            }
        };

        match inspect(raw) {
            Stored::Valid(settings) => settings,
            Stored::Completed(settings) => {
                self.write_back(&settings).await;
                settings
            }
            Stored::Missing => {
                let defaults = AlertSettings::default();
                info!("no alert settings stored; persisting defaults");
                self.write_back(&defaults).await;
                defaults
            }
            Stored::Corrupt(err) => {
                self.diagnostics.report(&err);
                metrics::increment_counter!(SETTINGS_RESETS);
                let defaults = AlertSettings::default();
                self.write_back(&defaults).await;
                defaults
            }
        }
    }

    /// Validates and persists `settings`; subscribers are notified by the store.
    pub async fn save_settings(&self, settings: &AlertSettings) -> Result<(), AlertingError> {
        settings.validate(ALERT_SETTINGS_KEY)?;
        let body = serde_json::to_string(settings)
            .map_err(|e| AlertingError::storage(e.into(), ALERT_SETTINGS_KEY))?;
        self.kv
            .set(ALERT_SETTINGS_KEY, body, ChangeOrigin::App)
            .await
            .map_err(|e| AlertingError::storage(e, ALERT_SETTINGS_KEY))?;
        info!(
            montage_alert_hours = settings.montage_alert_hours,
            depot_alert_hours = settings.depot_alert_hours,
            timezone = %settings.timezone,
            "alert settings saved"
        );
        Ok(())
    }

    /// Change notifications of the backend holding the settings.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.kv.subscribe()
    }

    /// Best-effort repair write; a failure is only reported.
    async fn write_back(&self, settings: &AlertSettings) {
        let body = match serde_json::to_string(settings) {
            Ok(b) => b,
            Err(e) => {
                self.diagnostics
                    .report(&AlertingError::storage(e.into(), ALERT_SETTINGS_KEY));
                return;
            }
        };
        if let Err(e) = self.kv.set(ALERT_SETTINGS_KEY, body, ChangeOrigin::App).await {
            self.diagnostics
                .report(&AlertingError::storage(e, ALERT_SETTINGS_KEY));
        }
    }
}
