// src/service/deadline_clock.rs
//! Time classification for deadlines.
//!
//! Every function takes the evaluation instant `now` explicitly, so one
//! generation cycle classifies all deadlines against the same clock reading.
//! Windows are compared at millisecond precision; displayed durations are
//! floored.

use chrono::{DateTime, Duration, Utc};

/// Shown instead of a duration once the deadline is reached.
pub const DEADLINE_PASSED: &str = "Échéance dépassée";

/// A deadline this close (or closer) is urgent.
pub const URGENT_THRESHOLD_HOURS: i64 = 2;

const MS_PER_HOUR: i64 = 3_600_000;

fn remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    deadline.signed_duration_since(now)
}

/// True when `0 < deadline - now <= hours`.
fn within_hours(deadline: DateTime<Utc>, now: DateTime<Utc>, hours: i64) -> bool {
    let ms = remaining(deadline, now).num_milliseconds();
    ms > 0 && ms <= hours.saturating_mul(MS_PER_HOUR)
}

/// `"{d}j {h}h {m}m"` beyond 24 hours, `"{h}h {m}m"` otherwise,
/// [`DEADLINE_PASSED`] once `deadline <= now`.
pub fn calculate_time_remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let left = remaining(deadline, now);
    if left <= Duration::zero() {
        return DEADLINE_PASSED.to_string();
    }
    let hours = left.num_hours();
    let minutes = left.num_minutes() % 60;
    if hours > 24 {
        format!("{}j {}h {}m", hours / 24, hours % 24, minutes)
    } else {
        format!("{hours}h {minutes}m")
    }
}

pub fn is_in_alert_period(deadline: DateTime<Utc>, lead_hours: i64, now: DateTime<Utc>) -> bool {
    within_hours(deadline, now, lead_hours)
}

pub fn is_expired(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    deadline <= now
}

pub fn is_urgent(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    within_hours(deadline, now, URGENT_THRESHOLD_HOURS)
}

/// All four classifications of one deadline against one `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineStatus {
    pub in_alert_period: bool,
    pub is_urgent: bool,
    pub is_expired: bool,
    pub time_remaining: String,
}

pub fn classify(deadline: DateTime<Utc>, lead_hours: i64, now: DateTime<Utc>) -> DeadlineStatus {
    DeadlineStatus {
        in_alert_period: is_in_alert_period(deadline, lead_hours, now),
        is_urgent: is_urgent(deadline, now),
        is_expired: is_expired(deadline, now),
        time_remaining: calculate_time_remaining(deadline, now),
    }
}
