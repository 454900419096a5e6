// tests/unit/alert_generator_test.rs

use std::sync::Arc;

use bms_alerts::service::diagnostics::RecordingDiagnosticSink;
use bms_alerts::{AlertGenerator, AlertLevel, AlertSettings, EngineOptions, Offer};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 14, 10, 0, 0).unwrap()
}

fn at(offset: Duration) -> String {
    (now() + offset).to_rfc3339()
}

fn generator(surface_expired: bool) -> AlertGenerator {
    AlertGenerator::new(
        EngineOptions { surface_expired },
        Arc::new(RecordingDiagnosticSink::new()),
    )
}

#[test]
fn generation_is_idempotent() {
    let gen = generator(true);
    let offers = vec![
        Offer::new(1).with_title("Gymnase").with_montage_deadline(at(Duration::hours(30))),
        Offer::new(2).with_depot_deadline(at(Duration::minutes(90))),
    ];
    let settings = AlertSettings::default();

    let first = gen.generate(&offers, &settings, now());
    let second = gen.generate(&offers, &settings, now() + Duration::seconds(2));

    let key = |alerts: &[bms_alerts::DeadlineAlert]| {
        alerts
            .iter()
            .map(|a| (a.id.clone(), a.level, a.is_urgent, a.is_expired))
            .collect::<Vec<_>>()
    };
    assert_eq!(key(&first), key(&second));
    assert_eq!(first.len(), 2);
}

#[test]
fn montage_window_boundary() {
    let gen = generator(false);
    let settings = AlertSettings::default();

    let inside = vec![Offer::new(1).with_montage_deadline(at(Duration::hours(72)))];
    let alerts = gen.generate(&inside, &settings, now());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].time_remaining, "3j 0h 0m");

    let outside = vec![Offer::new(1)
        .with_montage_deadline(at(Duration::hours(72) + Duration::seconds(1)))];
    assert!(gen.generate(&outside, &settings, now()).is_empty());

    let exactly_now = vec![Offer::new(1).with_montage_deadline(at(Duration::zero()))];
    assert!(gen.generate(&exactly_now, &settings, now()).is_empty());
}

#[test]
fn deadline_reached_now_surfaces_as_expired() {
    let gen = generator(true);
    let offers = vec![Offer::new(1).with_montage_deadline(at(Duration::zero()))];
    let alerts = gen.generate(&offers, &AlertSettings::default(), now());
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].is_expired);
    assert!(!alerts[0].is_urgent);
}

#[test]
fn urgency_threshold_sets_level() {
    let gen = generator(true);
    let settings = AlertSettings::default();

    let urgent = gen.generate(
        &[Offer::new(1).with_depot_deadline(at(Duration::hours(2)))],
        &settings,
        now(),
    );
    assert!(urgent[0].is_urgent);
    assert_eq!(urgent[0].level, AlertLevel::Error);

    let not_yet = gen.generate(
        &[Offer::new(1).with_depot_deadline(at(Duration::hours(2) + Duration::seconds(1)))],
        &settings,
        now(),
    );
    assert!(!not_yet[0].is_urgent);
    assert_eq!(not_yet[0].level, AlertLevel::Warning);
}

#[test]
fn expired_deadline_formatting() {
    let gen = generator(true);
    let alerts = gen.generate(
        &[Offer::new(3).with_title("Collège").with_depot_deadline(at(-Duration::minutes(5)))],
        &AlertSettings::default(),
        now(),
    );
    assert_eq!(alerts[0].time_remaining, "Échéance dépassée");
    assert!(alerts[0].is_expired);
}

#[test]
fn urgent_alerts_come_first_in_stable_order() {
    let gen = generator(true);
    let offers = vec![
        Offer::new(1).with_title("Lent").with_montage_deadline(at(Duration::hours(40))),
        Offer::new(2).with_title("Urgent A").with_depot_deadline(at(Duration::minutes(30))),
        Offer::new(3).with_title("Urgent B").with_montage_deadline(at(Duration::minutes(100))),
    ];
    let alerts = gen.generate(&offers, &AlertSettings::default(), now());
    let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["depot-2", "montage-3", "montage-1"]);
}

#[test]
fn kinds_are_evaluated_independently() {
    let gen = generator(true);
    let offers = vec![Offer::new(7)
        .with_montage_deadline(at(Duration::hours(10)))
        .with_depot_deadline(at(Duration::hours(30)))];
    let alerts = gen.generate(&offers, &AlertSettings::default(), now());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].id, "montage-7");
    assert_eq!(alerts[0].title, "Montage Administratif");

    let both = vec![Offer::new(7)
        .with_montage_deadline(at(Duration::hours(10)))
        .with_depot_deadline(at(Duration::hours(10)))];
    let alerts = gen.generate(&both, &AlertSettings::default(), now());
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[1].title, "Dépôt d'Offre");
}

#[test]
fn custom_windows_are_honoured() {
    let gen = generator(false);
    let settings = AlertSettings {
        montage_alert_hours: 5,
        depot_alert_hours: 100,
        timezone: "Europe/Paris".into(),
    };
    let offers = vec![Offer::new(1)
        .with_montage_deadline(at(Duration::hours(6)))
        .with_depot_deadline(at(Duration::hours(99)))];
    let alerts = gen.generate(&offers, &settings, now());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].id, "depot-1");
}
