// src/domain/model/offer.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::domain::error::{AlertingError, ErrorContext};
use crate::domain::model::alert::AlertKind;

/// Title shown when an offer has no `intituleOffre`.
pub const UNTITLED_OFFER: &str = "Offre sans titre";

/// An offer record as persisted by the BMS front-end.
///
/// Only the fields the alert engine reads are typed; everything else the
/// application stores on the record is carried in `extra` so that writes
/// through [`OfferStore`](crate::repository::offer_store::OfferStore) never drop data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: i64,

    #[serde(
        rename = "intituleOffre",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub intitule_offre: Option<String>,

    /// Administrative-assembly transmission deadline, as typed by the user.
    #[serde(
        rename = "delaiTransmissionMontageAdministratif",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub delai_transmission_montage_administratif: Option<String>,

    /// Planned submission deadline, as typed by the user.
    #[serde(
        rename = "dateDepotPrevu",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_depot_prevu: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

impl Offer {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            intitule_offre: None,
            delai_transmission_montage_administratif: None,
            date_depot_prevu: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.intitule_offre = Some(title.into());
        self
    }

    pub fn with_montage_deadline(mut self, raw: impl Into<String>) -> Self {
        self.delai_transmission_montage_administratif = Some(raw.into());
        self
    }

    pub fn with_depot_deadline(mut self, raw: impl Into<String>) -> Self {
        self.date_depot_prevu = Some(raw.into());
        self
    }

    /// Display title, falling back to a placeholder for blank titles.
    pub fn display_title(&self) -> &str {
        match self.intitule_offre.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => UNTITLED_OFFER,
        }
    }

    pub fn raw_deadline(&self, kind: AlertKind) -> Option<&str> {
        let raw = match kind {
            AlertKind::Montage => self.delai_transmission_montage_administratif.as_deref(),
            AlertKind::Depot => self.date_depot_prevu.as_deref(),
        };
        raw.map(str::trim).filter(|s| !s.is_empty())
    }

    /// `None` when the field is absent or blank; `Some(Err(_))` when it is
    /// present but not a date-time.
    pub fn deadline(&self, kind: AlertKind) -> Option<Result<DateTime<Utc>, AlertingError>> {
        let raw = self.raw_deadline(kind)?;
        Some(parse_deadline(raw).ok_or_else(|| AlertingError::InvalidDeadline {
            raw: raw.to_string(),
            context: ErrorContext::for_field(self.id, kind.field_name()),
        }))
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses the date-time shapes the BMS forms produce. Values without an
/// offset are read as UTC.
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Keeps strings, maps every other JSON value (null, numbers, objects) to `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Some(s),
        _ => None,
    })
}
