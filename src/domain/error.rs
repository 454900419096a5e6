// src/domain/error.rs

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Operational impact of an error, used to decide whether a cycle can go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorImpact {
    /// The affected item is skipped; everything else is still processed.
    Recoverable,
    /// Nothing from the affected source can be used during this cycle.
    NonRecoverable,
}

/// Context attached to every error for traceability.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    pub offer_id: Option<i64>,
    pub field: Option<String>,
    pub storage_key: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorContext {
    pub fn new(offer_id: Option<i64>, field: Option<&str>, storage_key: Option<&str>) -> Self {
        Self {
            offer_id,
            field: field.map(str::to_string),
            storage_key: storage_key.map(str::to_string),
            timestamp: Utc::now(),
        }
    }

    pub fn for_key(storage_key: &str) -> Self {
        Self::new(None, None, Some(storage_key))
    }

    pub fn for_field(offer_id: i64, field: &str) -> Self {
        Self::new(Some(offer_id), Some(field), None)
    }
}

/// Failures the alert engine can observe. None of them reach alert consumers;
/// they are reported to a [`DiagnosticSink`](crate::service::diagnostics::DiagnosticSink).
#[derive(Error, Debug)]
pub enum AlertingError {
    #[error("offer collection is unreadable: {message}")]
    MalformedOfferCollection { message: String, context: ErrorContext },

    #[error("offer record #{index} skipped: {message}")]
    MalformedOfferRecord {
        index: usize,
        message: String,
        context: ErrorContext,
    },

    #[error("deadline '{raw}' cannot be parsed")]
    InvalidDeadline { raw: String, context: ErrorContext },

    #[error("persisted alert settings are corrupt: {message}")]
    CorruptSettings { message: String, context: ErrorContext },

    #[error("alert settings rejected: {message}")]
    InvalidSettings { message: String, context: ErrorContext },

    #[error("storage failure: {source}")]
    Storage {
        #[source]
        source: anyhow::Error,
        context: ErrorContext,
    },
}

impl AlertingError {
    pub fn impact(&self) -> ErrorImpact {
        match self {
            AlertingError::MalformedOfferRecord { .. }
            | AlertingError::InvalidDeadline { .. }
            | AlertingError::CorruptSettings { .. }
            | AlertingError::InvalidSettings { .. } => ErrorImpact::Recoverable,
            AlertingError::MalformedOfferCollection { .. } | AlertingError::Storage { .. } => {
                ErrorImpact::NonRecoverable
            }
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            AlertingError::MalformedOfferCollection { context, .. }
            | AlertingError::MalformedOfferRecord { context, .. }
            | AlertingError::InvalidDeadline { context, .. }
            | AlertingError::CorruptSettings { context, .. }
            | AlertingError::InvalidSettings { context, .. }
            | AlertingError::Storage { context, .. } => context,
        }
    }

    /// Short stable label, used as a metric label and a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AlertingError::MalformedOfferCollection { .. } => "malformed_offer_collection",
            AlertingError::MalformedOfferRecord { .. } => "malformed_offer_record",
            AlertingError::InvalidDeadline { .. } => "invalid_deadline",
            AlertingError::CorruptSettings { .. } => "corrupt_settings",
            AlertingError::InvalidSettings { .. } => "invalid_settings",
            AlertingError::Storage { .. } => "storage",
        }
    }

    pub fn storage(source: anyhow::Error, key: &str) -> Self {
        AlertingError::Storage {
            source,
            context: ErrorContext::for_key(key),
        }
    }
}
