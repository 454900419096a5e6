// src/service/alert_generator.rs
//! Alert generator.
//!
//! Turns an offer snapshot and the current settings into the complete list
//! of active deadline alerts:
//! - each offer contributes at most one montage and one depot alert, evaluated independently;
//! - alert ids are derived from kind and offer id, so regenerations never duplicate;
//! - urgent alerts come first, otherwise iteration order is kept (stable sort);
//! - failures collapse to "no alert" and are reported to the diagnostic sink.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::error::AlertingError;
use crate::domain::model::alert::{AlertKind, DeadlineAlert};
use crate::domain::model::offer::Offer;
use crate::domain::model::settings::AlertSettings;
use crate::domain::model::severity::AlertLevel;
use crate::repository::offer_store::OfferSnapshot;
use crate::service::deadline_clock;
use crate::service::diagnostics::DiagnosticSink;

/// Generation behaviour that is not part of the user-editable settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Also raise an alert for deadlines that are already passed, so a
    /// deadline missed between two cycles is still shown.
    pub surface_expired: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { surface_expired: true }
    }
}

pub struct AlertGenerator {
    options: EngineOptions,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl AlertGenerator {
    pub fn new(options: EngineOptions, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self { options, diagnostics }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Generator boundary: an unreadable collection yields an empty list.
    pub fn generate_from(
        &self,
        snapshot: Result<OfferSnapshot, AlertingError>,
        settings: &AlertSettings,
        now: DateTime<Utc>,
    ) -> Vec<DeadlineAlert> {
        match snapshot {
            Ok(snapshot) => {
                for skipped in &snapshot.skipped {
                    self.diagnostics.report(skipped);
                }
                self.generate(&snapshot.offers, settings, now)
            }
            Err(err) => {
                self.diagnostics.report(&err);
                Vec::new()
            }
        }
    }

    pub fn generate(
        &self,
        offers: &[Offer],
        settings: &AlertSettings,
        now: DateTime<Utc>,
    ) -> Vec<DeadlineAlert> {
        let mut alerts = Vec::new();
        for offer in offers {
            for kind in AlertKind::ALL {
                let deadline = match offer.deadline(kind) {
                    None => continue,
                    Some(Ok(d)) => d,
                    Some(Err(err)) => {
                        self.diagnostics.report(&err);
                        continue;
                    }
                };
                if let Some(alert) = self.alert_for(offer, kind, deadline, settings, now) {
                    alerts.push(alert);
                }
            }
        }
        sort_by_urgency(&mut alerts);
        alerts
    }

    fn alert_for(
        &self,
        offer: &Offer,
        kind: AlertKind,
        deadline: DateTime<Utc>,
        settings: &AlertSettings,
        now: DateTime<Utc>,
    ) -> Option<DeadlineAlert> {
        let status = deadline_clock::classify(deadline, settings.lead_hours(kind), now);
        let surfaced_expired = self.options.surface_expired && status.is_expired;
        if !status.in_alert_period && !surfaced_expired {
            return None;
        }

        // `error` when urgent, `warning` otherwise; a surfaced expired
        // deadline is not urgent but still reported as `error`.
        let level = if status.is_urgent || status.is_expired {
            AlertLevel::Error
        } else {
            AlertLevel::Warning
        };
        let title = offer.display_title();

        Some(DeadlineAlert {
            id: kind.alert_id(offer.id),
            level,
            title: kind.title().to_string(),
            message: kind.message(title, status.is_expired),
            time_remaining: status.time_remaining,
            offre_id: offer.id,
            offre_title: title.to_string(),
            is_urgent: status.is_urgent,
            is_expired: status.is_expired,
        })
    }
}

/// Urgent first; ties keep their order.
pub fn sort_by_urgency(alerts: &mut [DeadlineAlert]) {
    alerts.sort_by_key(|a| !a.is_urgent);
}
