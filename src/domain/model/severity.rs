// src/domain/model/severity.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Presentation level of a deadline alert (`type` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Accepted on the wire; the deadline engine never emits it.
    Info,
    /// Deadline inside its lead-time window.
    Warning,
    /// Deadline urgent (two hours or less) or already passed.
    Error,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Error => "error",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
