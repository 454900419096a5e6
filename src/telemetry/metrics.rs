// src/telemetry/metrics.rs
//! Metric names and descriptions.
//!
//! The library records through the `metrics` facade; whichever recorder the
//! host installs receives them. Without a recorder the calls are no-ops.

use metrics::{describe_counter, describe_gauge, Unit};

pub const ALERT_CYCLES: &str = "bms_alert_cycles_total";
pub const ALERTS_EMITTED: &str = "bms_alerts_emitted_total";
pub const ALERT_DIAGNOSTICS: &str = "bms_alert_diagnostics_total";
pub const SETTINGS_RESETS: &str = "bms_settings_resets_total";
pub const ALERTS_ACTIVE: &str = "bms_alerts_active";

pub fn register_core_metrics() {
    describe_counter!(ALERT_CYCLES, Unit::Count, "Evaluation passes run");
    describe_counter!(ALERTS_EMITTED, Unit::Count, "Alerts produced, summed over passes");
    describe_counter!(
        ALERT_DIAGNOSTICS,
        Unit::Count,
        "Failures absorbed by the engine, labelled by kind"
    );
    describe_counter!(
        SETTINGS_RESETS,
        Unit::Count,
        "Corrupt alert settings replaced by defaults"
    );
    describe_gauge!(ALERTS_ACTIVE, Unit::Count, "Alerts in the latest pass");
}
