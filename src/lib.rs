// src/lib.rs
//! Deadline alert engine for the BMS offer-management application.
//!
//! Scans the offer collection, checks the administrative-assembly and
//! submission deadlines against the configured lead-time windows, and
//! publishes a sorted list of active alerts. Evaluation runs at start-up,
//! every refresh interval, and whenever offers or settings change in storage.

pub mod config {
    pub mod app_config;
}

pub mod domain {
    pub mod error;
    pub mod model {
        pub mod alert;
        pub mod offer;
        pub mod settings;
        pub mod severity;
    }
}

pub mod repository {
    pub mod kv_store;
    pub mod offer_store;
    pub mod settings_store;
}

pub mod service {
    pub mod alert_board;
    pub mod alert_engine;
    pub mod alert_generator;
    pub mod deadline_clock;
    pub mod diagnostics;
}

pub mod scheduler {
    pub mod alert_scheduler;
}

pub mod telemetry {
    pub mod metrics;
    pub mod tracing;
}

pub use domain::error::{AlertingError, ErrorImpact};
pub use domain::model::alert::{AlertKind, DeadlineAlert};
pub use domain::model::offer::Offer;
pub use domain::model::settings::AlertSettings;
pub use domain::model::severity::AlertLevel;
pub use scheduler::alert_scheduler::{AlertScheduler, AlertSchedulerConfig, AlertSchedulerHandle};
pub use service::alert_board::{AlertBoard, AlertSnapshot};
pub use service::alert_engine::AlertEngine;
pub use service::alert_generator::{AlertGenerator, EngineOptions};
