// src/domain/model/alert.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::model::severity::AlertLevel;

/// The two deadlines an offer can raise alerts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// `delaiTransmissionMontageAdministratif`
    Montage,
    /// `dateDepotPrevu`
    Depot,
}

impl AlertKind {
    pub const ALL: [AlertKind; 2] = [AlertKind::Montage, AlertKind::Depot];

    pub fn id_prefix(&self) -> &'static str {
        match self {
            AlertKind::Montage => "montage",
            AlertKind::Depot => "depot",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AlertKind::Montage => "Montage Administratif",
            AlertKind::Depot => "Dépôt d'Offre",
        }
    }

    /// Name of the offer field carrying this deadline.
    pub fn field_name(&self) -> &'static str {
        match self {
            AlertKind::Montage => "delaiTransmissionMontageAdministratif",
            AlertKind::Depot => "dateDepotPrevu",
        }
    }

    /// Deterministic alert id for an offer, stable across regenerations.
    pub fn alert_id(&self, offer_id: i64) -> String {
        format!("{}-{}", self.id_prefix(), offer_id)
    }

    pub fn message(&self, offer_title: &str, expired: bool) -> String {
        match (self, expired) {
            (AlertKind::Montage, false) => format!(
                "Le délai de transmission au montage administratif de l'offre \"{offer_title}\" approche"
            ),
            (AlertKind::Montage, true) => format!(
                "Le délai de transmission au montage administratif de l'offre \"{offer_title}\" est dépassé"
            ),
            (AlertKind::Depot, false) => {
                format!("La date de dépôt prévue de l'offre \"{offer_title}\" approche")
            }
            (AlertKind::Depot, true) => {
                format!("La date de dépôt prévue de l'offre \"{offer_title}\" est dépassée")
            }
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id_prefix())
    }
}

/// One active deadline alert. Rebuilt from scratch on every evaluation and
/// never persisted; serialized field names match the dashboard payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineAlert {
    /// `"montage-<offre id>"` or `"depot-<offre id>"`.
    pub id: String,
    #[serde(rename = "type")]
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
    pub time_remaining: String,
    pub offre_id: i64,
    pub offre_title: String,
    pub is_urgent: bool,
    pub is_expired: bool,
}

impl DeadlineAlert {
    /// Kind recovered from the deterministic id.
    pub fn kind(&self) -> Option<AlertKind> {
        let (prefix, _) = self.id.split_once('-')?;
        AlertKind::ALL.into_iter().find(|k| k.id_prefix() == prefix)
    }
}
