// tests/unit/settings_store_test.rs

use std::sync::Arc;

use bms_alerts::repository::kv_store::{
    ChangeOrigin, InMemoryKeyValueStore, KeyValueStore, ALERT_SETTINGS_KEY,
};
use bms_alerts::repository::settings_store::SettingsStore;
use bms_alerts::service::diagnostics::RecordingDiagnosticSink;
use bms_alerts::AlertSettings;

fn setup() -> (SettingsStore, Arc<InMemoryKeyValueStore>, RecordingDiagnosticSink) {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let sink = RecordingDiagnosticSink::new();
    let store = SettingsStore::new(kv.clone(), Arc::new(sink.clone()));
    (store, kv, sink)
}

#[tokio::test]
async fn corrupt_settings_fall_back_and_heal() {
    let (store, kv, sink) = setup();
    kv.set(ALERT_SETTINGS_KEY, "{not json".into(), ChangeOrigin::External)
        .await
        .unwrap();

    let loaded = store.load_settings().await;
    assert_eq!(loaded.montage_alert_hours, 72);
    assert_eq!(loaded.depot_alert_hours, 24);
    assert_eq!(loaded.timezone, "UTC");
    assert_eq!(sink.kinds(), vec!["corrupt_settings"]);

    let raw = kv.get(ALERT_SETTINGS_KEY).await.unwrap().unwrap();
    let healed: AlertSettings = serde_json::from_str(&raw).unwrap();
    assert_eq!(healed, AlertSettings::default());

    // second load reads the healed value and reports nothing new
    store.load_settings().await;
    assert_eq!(sink.entries().len(), 1);
}

#[tokio::test]
async fn defaults_are_persisted_on_first_use() {
    let (store, kv, sink) = setup();
    assert!(kv.get(ALERT_SETTINGS_KEY).await.unwrap().is_none());

    assert_eq!(store.load_settings().await, AlertSettings::default());
    assert!(kv.get(ALERT_SETTINGS_KEY).await.unwrap().is_some());
    assert!(sink.entries().is_empty());
}

#[tokio::test]
async fn wrong_types_are_corrupt() {
    let (store, kv, sink) = setup();
    kv.set(
        ALERT_SETTINGS_KEY,
        r#"{"montageAlertHours": "72", "depotAlertHours": 24, "timezone": "UTC"}"#.into(),
        ChangeOrigin::External,
    )
    .await
    .unwrap();
    assert_eq!(store.load_settings().await, AlertSettings::default());
    assert_eq!(sink.kinds(), vec!["corrupt_settings"]);
}

#[tokio::test]
async fn save_persists_and_notifies() {
    let (store, kv, _) = setup();
    let mut events = kv.subscribe();

    let custom = AlertSettings {
        montage_alert_hours: 48,
        depot_alert_hours: 12,
        timezone: "Europe/Paris".into(),
    };
    store.save_settings(&custom).await.unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(event.key, ALERT_SETTINGS_KEY);
    assert_eq!(event.origin, ChangeOrigin::App);
    assert_eq!(store.load_settings().await, custom);

    let raw = kv.get(ALERT_SETTINGS_KEY).await.unwrap().unwrap();
    assert!(raw.contains("\"montageAlertHours\":48"));
}
