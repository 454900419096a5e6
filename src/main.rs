// src/main.rs
//! Entry point of `bms-alerts`.
//!
//! - Load configuration, logging and metric descriptions.
//! - Open the configured storage and start the alert scheduler.
//! - Log every published alert snapshot.
//! - Shut down cleanly on Ctrl+C / SIGTERM.

use std::{sync::Arc, time::Duration};

use tokio::{select, signal, sync::broadcast, task::JoinSet};
use tracing::{error, info, warn};

use bms_alerts::config::app_config::{AppConfig, StorageBackend};
use bms_alerts::repository::kv_store::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};
use bms_alerts::service::diagnostics::TracingDiagnosticSink;
use bms_alerts::telemetry;
use bms_alerts::{AlertBoard, AlertEngine, AlertScheduler};

/// Shutdown signal shared between background tasks.
#[derive(Clone)]
struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    fn new() -> Self {
        let (tx, _rx) = broadcast::channel(8);
        Self { tx }
    }
    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
    fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

#[tokio::main]
async fn main() {
    // 1) Configuration
    let cfg = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("cannot load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    // 2) Logging + metrics
    if let Err(e) = telemetry::tracing::init_tracing(&cfg.logging) {
        eprintln!("logging not initialised: {e:#}");
    }
    telemetry::metrics::register_core_metrics();

    // 3) Storage
    let mut file_store = None;
    let kv: Arc<dyn KeyValueStore> = match cfg.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryKeyValueStore::new()),
        StorageBackend::File => {
            let Some(path) = cfg.storage_path() else {
                error!("storage.path missing for the file backend");
                std::process::exit(1);
            };
            match FileKeyValueStore::open(path).await {
                Ok(store) => {
                    let store = Arc::new(store);
                    file_store = Some(store.clone());
                    store as Arc<dyn KeyValueStore>
                }
                Err(e) => {
                    error!(error = ?e, "cannot open storage");
                    std::process::exit(1);
                }
            }
        }
    };

    // 4) Engine + scheduler
    let engine = Arc::new(AlertEngine::from_store(
        kv,
        cfg.engine_options(),
        Arc::new(TracingDiagnosticSink),
    ));
    let board = Arc::new(AlertBoard::new());
    let scheduler = Arc::new(AlertScheduler::new(
        engine.clone(),
        board.clone(),
        cfg.scheduler_config(),
    ));

    let shutdown = Shutdown::new();
    let mut tasks = JoinSet::new();

    // 4.a) Snapshot logger
    {
        let mut rx = board.subscribe();
        let mut stop = shutdown.subscribe();
        tasks.spawn(async move {
            loop {
                select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snap = rx.borrow_and_update().clone();
                        info!(
                            revision = snap.revision,
                            alerts = snap.alerts.len(),
                            urgent = snap.urgent_count(),
                            expired = snap.expired_count(),
                            visible = snap.is_visible,
                            "alert snapshot published"
                        );
                        for alert in snap.visible_alerts() {
                            info!(
                                id = %alert.id,
                                level = %alert.level,
                                remaining = %alert.time_remaining,
                                offer = %alert.offre_title,
                                "{}", alert.message
                            );
                        }
                    }
                    _ = stop.recv() => break,
                }
            }
        });
    }

    // 4.b) Pick up edits other processes make to the storage file
    if let Some(store) = file_store.filter(|_| cfg.storage.reload_interval_secs > 0) {
        let period = Duration::from_secs(cfg.storage.reload_interval_secs);
        let mut stop = shutdown.subscribe();
        tasks.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                select! {
                    _ = ticker.tick() => {
                        if let Err(e) = store.reload().await {
                            warn!(error = ?e, path = %store.path().display(), "storage reload failed");
                        }
                    }
                    _ = stop.recv() => break,
                }
            }
        });
    }

    let handle = scheduler.start();

    // 5) Wait for a stop signal
    info!(profile = %cfg.environment.profile, "bms-alerts running");
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = ?e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!(error = ?e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("stop signal received; shutting down");

    // 6) Graceful shutdown
    shutdown.trigger();
    let grace = Duration::from_secs(10);
    let stopped = tokio::time::timeout(grace, async {
        if let Err(e) = handle.shutdown().await {
            warn!(error = ?e, "alert scheduler did not stop cleanly");
        }
        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                error!(error = ?e, "background task failed during shutdown");
            }
        }
    })
    .await;

    match stopped {
        Ok(()) => info!("shutdown complete"),
        Err(_) => warn!("shutdown timed out; exiting anyway"),
    }
}
