// src/domain/model/settings.rs

use serde::{Deserialize, Serialize};

use crate::domain::error::{AlertingError, ErrorContext};
use crate::domain::model::alert::AlertKind;

pub const DEFAULT_MONTAGE_ALERT_HOURS: i64 = 72;
pub const DEFAULT_DEPOT_ALERT_HOURS: i64 = 24;
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Lead-time windows for the two deadline kinds. `timezone` is a display
/// label only; deadlines are always compared in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSettings {
    #[serde(default = "default_montage_hours")]
    pub montage_alert_hours: i64,
    #[serde(default = "default_depot_hours")]
    pub depot_alert_hours: i64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_montage_hours() -> i64 {
    DEFAULT_MONTAGE_ALERT_HOURS
}

fn default_depot_hours() -> i64 {
    DEFAULT_DEPOT_ALERT_HOURS
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            montage_alert_hours: DEFAULT_MONTAGE_ALERT_HOURS,
            depot_alert_hours: DEFAULT_DEPOT_ALERT_HOURS,
            timezone: default_timezone(),
        }
    }
}

impl AlertSettings {
    pub fn lead_hours(&self, kind: AlertKind) -> i64 {
        match kind {
            AlertKind::Montage => self.montage_alert_hours,
            AlertKind::Depot => self.depot_alert_hours,
        }
    }

    pub fn validate(&self, storage_key: &str) -> Result<(), AlertingError> {
        let problem = if self.montage_alert_hours <= 0 {
            Some(format!("montageAlertHours must be positive, got {}", self.montage_alert_hours))
        } else if self.depot_alert_hours <= 0 {
            Some(format!("depotAlertHours must be positive, got {}", self.depot_alert_hours))
        } else if self.timezone.trim().is_empty() {
            Some("timezone must not be empty".to_string())
        } else {
            None
        };
        match problem {
            Some(message) => Err(AlertingError::InvalidSettings {
                message,
                context: ErrorContext::for_key(storage_key),
            }),
            None => Ok(()),
        }
    }
}
