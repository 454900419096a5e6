// tests/integration/alert_refresh_flow_test.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bms_alerts::repository::kv_store::{
    ChangeOrigin, InMemoryKeyValueStore, KeyValueStore, ALERT_SETTINGS_KEY, OFFERS_KEY,
};
use bms_alerts::repository::offer_store::OfferStore;
use bms_alerts::repository::settings_store::SettingsStore;
use bms_alerts::service::diagnostics::RecordingDiagnosticSink;
use bms_alerts::{
    AlertBoard, AlertEngine, AlertGenerator, AlertScheduler, AlertSchedulerConfig, AlertSettings, AlertSnapshot,
    EngineOptions, Offer,
};
use chrono::Utc;
use tokio::sync::watch;

struct Harness {
    kv: Arc<InMemoryKeyValueStore>,
    engine: Arc<AlertEngine>,
    board: Arc<AlertBoard>,
    sink: RecordingDiagnosticSink,
}

/// Settings are seeded so that start-up does not write defaults back and
/// cause an extra change-driven cycle.
fn harness() -> Harness {
    let settings = serde_json::to_string(&AlertSettings::default()).unwrap();
    let kv = Arc::new(InMemoryKeyValueStore::with_entries(HashMap::from([(
        ALERT_SETTINGS_KEY.to_string(),
        settings,
    )])));
    let sink = RecordingDiagnosticSink::new();
    let engine = Arc::new(AlertEngine::from_store(
        kv.clone(),
        EngineOptions::default(),
        Arc::new(sink.clone()),
    ));
    Harness {
        kv,
        engine,
        board: Arc::new(AlertBoard::new()),
        sink,
    }
}

impl Harness {
    fn scheduler(&self) -> Arc<AlertScheduler> {
        Arc::new(AlertScheduler::new(
            self.engine.clone(),
            self.board.clone(),
            AlertSchedulerConfig::default(),
        ))
    }
}

fn in_hours(hours: i64) -> String {
    (Utc::now() + chrono::Duration::hours(hours)).to_rfc3339()
}

async fn wait_for<F>(rx: &mut watch::Receiver<AlertSnapshot>, mut pred: F) -> AlertSnapshot
where
    F: FnMut(&AlertSnapshot) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let snap = rx.borrow_and_update();
                if pred(&*snap) {
                    return snap.clone();
                }
            }
            rx.changed().await.expect("board dropped");
        }
    })
    .await
    .expect("condition not reached in time")
}

#[tokio::test]
async fn dismissed_alert_returns_on_next_cycle() {
    let h = harness();
    h.engine
        .offer_store()
        .upsert_offer(Offer::new(1).with_title("Halle").with_depot_deadline(in_hours(1)))
        .await
        .unwrap();

    let mut rx = h.board.subscribe();
    let handle = h.scheduler().start();
    let first = wait_for(&mut rx, |s| s.contains("depot-1")).await;

    assert!(h.board.dismiss("depot-1"));
    let dismissed = wait_for(&mut rx, |s| !s.contains("depot-1")).await;
    assert_eq!(dismissed.revision, first.revision);

    handle.refresh().unwrap();
    let again = wait_for(&mut rx, |s| s.revision > first.revision && s.contains("depot-1")).await;
    assert_eq!(again.alerts.iter().filter(|a| a.id == "depot-1").count(), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn saving_settings_reevaluates_immediately() {
    let h = harness();
    h.engine
        .offer_store()
        .upsert_offer(Offer::new(4).with_montage_deadline(in_hours(100)))
        .await
        .unwrap();

    let mut rx = h.board.subscribe();
    let handle = h.scheduler().start();
    let before = wait_for(&mut rx, |s| s.revision >= 1).await;
    assert!(before.alerts.is_empty());

    h.engine
        .settings_store()
        .save_settings(&AlertSettings {
            montage_alert_hours: 120,
            ..AlertSettings::default()
        })
        .await
        .unwrap();

    let after = wait_for(&mut rx, |s| s.contains("montage-4")).await;
    assert!(!after.alerts[0].is_urgent);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn settings_on_their_own_backend_still_trigger_a_cycle() {
    let offers_kv = Arc::new(InMemoryKeyValueStore::new());
    let settings_kv = Arc::new(InMemoryKeyValueStore::with_entries(HashMap::from([(
        ALERT_SETTINGS_KEY.to_string(),
        serde_json::to_string(&AlertSettings::default()).unwrap(),
    )])));
    let sink = Arc::new(RecordingDiagnosticSink::new());
    let engine = Arc::new(AlertEngine::new(
        OfferStore::new(offers_kv),
        SettingsStore::new(settings_kv, sink.clone()),
        AlertGenerator::new(EngineOptions::default(), sink),
    ));
    engine
        .offer_store()
        .upsert_offer(Offer::new(8).with_montage_deadline(in_hours(100)))
        .await
        .unwrap();

    let board = Arc::new(AlertBoard::new());
    let mut rx = board.subscribe();
    let handle = Arc::new(AlertScheduler::new(
        engine.clone(),
        board.clone(),
        AlertSchedulerConfig::default(),
    ))
    .start();
    let before = wait_for(&mut rx, |s| s.revision >= 1).await;
    assert!(before.alerts.is_empty());

    engine
        .settings_store()
        .save_settings(&AlertSettings {
            montage_alert_hours: 120,
            ..AlertSettings::default()
        })
        .await
        .unwrap();

    let after = wait_for(&mut rx, |s| s.contains("montage-8")).await;
    assert_eq!(after.revision, before.revision + 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn external_offer_write_reevaluates_immediately() {
    let h = harness();
    let mut rx = h.board.subscribe();
    let handle = h.scheduler().start();
    wait_for(&mut rx, |s| s.revision >= 1).await;

    let body = serde_json::json!([
        { "id": 10, "intituleOffre": "Médiathèque", "dateDepotPrevu": in_hours(5) },
        { "id": 11, "intituleOffre": "Crèche", "delaiTransmissionMontageAdministratif": in_hours(1) }
    ])
    .to_string();
    h.kv.set(OFFERS_KEY, body, ChangeOrigin::External).await.unwrap();

    let snap = wait_for(&mut rx, |s| s.alerts.len() == 2).await;
    assert_eq!(snap.alerts[0].id, "montage-11");
    assert!(snap.alerts[0].is_urgent);
    assert_eq!(snap.alerts[1].offre_title, "Médiathèque");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn unreadable_collection_publishes_empty_list() {
    let h = harness();
    h.kv.set(OFFERS_KEY, "{\"oops\": true}".into(), ChangeOrigin::External)
        .await
        .unwrap();

    let mut rx = h.board.subscribe();
    let handle = h.scheduler().start();
    let snap = wait_for(&mut rx, |s| s.revision >= 1).await;

    assert!(snap.alerts.is_empty());
    assert!(h.sink.kinds().contains(&"malformed_offer_collection"));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn interval_tick_reevaluates() {
    let h = harness();
    let handle = h.scheduler().start();
    let mut rx = h.board.subscribe();
    wait_for(&mut rx, |s| s.revision >= 1).await;
    assert_eq!(h.board.snapshot().revision, 1);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(h.board.snapshot().revision, 2);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.board.snapshot().revision, 3);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn hidden_board_still_refreshes() {
    let h = harness();
    h.engine
        .offer_store()
        .upsert_offer(Offer::new(2).with_depot_deadline(in_hours(3)))
        .await
        .unwrap();
    h.board.set_visible(false);

    let mut rx = h.board.subscribe();
    let handle = h.scheduler().start();
    let snap = wait_for(&mut rx, |s| s.contains("depot-2")).await;

    assert!(!snap.is_visible);
    assert!(snap.visible_alerts().is_empty());
    assert_eq!(snap.alerts.len(), 1);

    handle.shutdown().await.unwrap();
}
