// tests/unit/deadline_clock_test.rs

use bms_alerts::service::deadline_clock::{
    calculate_time_remaining, is_expired, is_in_alert_period, is_urgent, DEADLINE_PASSED,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 14, 30, 0).unwrap()
}

#[test]
fn alert_period_boundaries() {
    let n = now();
    assert!(is_in_alert_period(n + Duration::hours(72), 72, n));
    assert!(!is_in_alert_period(n + Duration::hours(72) + Duration::seconds(1), 72, n));
    assert!(is_in_alert_period(n + Duration::milliseconds(1), 72, n));
    assert!(!is_in_alert_period(n, 72, n));
    assert!(!is_in_alert_period(n - Duration::hours(1), 72, n));
}

#[test]
fn urgency_boundaries() {
    let n = now();
    assert!(is_urgent(n + Duration::hours(2), n));
    assert!(!is_urgent(n + Duration::hours(2) + Duration::seconds(1), n));
    assert!(!is_urgent(n, n));
    assert!(!is_urgent(n - Duration::minutes(1), n));
}

#[test]
fn expiry_includes_the_exact_instant() {
    let n = now();
    assert!(is_expired(n, n));
    assert!(is_expired(n - Duration::minutes(5), n));
    assert!(!is_expired(n + Duration::seconds(1), n));
}

#[test]
fn remaining_time_strings() {
    let n = now();
    assert_eq!(calculate_time_remaining(n - Duration::minutes(5), n), DEADLINE_PASSED);
    assert_eq!(calculate_time_remaining(n + Duration::minutes(45), n), "0h 45m");
    assert_eq!(
        calculate_time_remaining(n + Duration::hours(24) + Duration::minutes(59), n),
        "24h 59m"
    );
    assert_eq!(
        calculate_time_remaining(n + Duration::hours(25), n),
        "1j 1h 0m"
    );
    assert_eq!(
        calculate_time_remaining(n + Duration::hours(71) + Duration::minutes(59) + Duration::seconds(59), n),
        "2j 23h 59m"
    );
}
