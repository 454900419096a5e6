// src/scheduler/alert_scheduler.rs
//! Alert refresh scheduler
//!
//! Responsibilities:
//! - Run one evaluation as soon as it starts.
//! - Re-evaluate on a fixed interval (60 s by default).
//! - Re-evaluate right away when the offer collection or the alert settings
//!   change in storage, or when a refresh is requested through the handle.
//! - Publish every result on the [`AlertBoard`].
//!
//! Every trigger funnels into the same `run_cycle`. Triggers arriving close
//! together just produce sequential full recomputations; the later one wins.
//!
//! Usage pattern:
//! - Build with an `AlertEngine` and an `AlertBoard`, call `start()`.
//! - Use `handle.refresh()` for an immediate run.
//! - Call `handle.shutdown().await` to stop; dropping the handle aborts the loop.

use std::{fmt, sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use anyhow::Context;

use crate::repository::kv_store::{StorageEvent, ALERT_SETTINGS_KEY, OFFERS_KEY};
use crate::service::alert_board::AlertBoard;
use crate::service::alert_engine::AlertEngine;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct AlertSchedulerConfig {
    pub refresh_interval: Duration,
    /// Pending manual refreshes beyond this are coalesced.
    pub refresh_buffer: usize,
}

impl Default for AlertSchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            refresh_buffer: 8,
        }
    }
}

/// Why a cycle ran; logged with every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Interval,
    StorageChange(String),
    /// The event receiver fell behind; changes were missed, so re-read everything.
    MissedChanges(u64),
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Startup => f.write_str("startup"),
            Trigger::Interval => f.write_str("interval"),
            Trigger::StorageChange(key) => write!(f, "storage:{key}"),
            Trigger::MissedChanges(n) => write!(f, "missed:{n}"),
            Trigger::Manual => f.write_str("manual"),
        }
    }
}

/// Control handle. Dropping it without `shutdown` aborts the loop.
pub struct AlertSchedulerHandle {
    refresh_tx: mpsc::Sender<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl AlertSchedulerHandle {
    /// Requests an immediate evaluation. A full buffer means a refresh is
    /// already pending, which is enough.
    pub fn refresh(&self) -> anyhow::Result<()> {
        match self.refresh_tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(())) => {
                anyhow::bail!("alert scheduler is not running")
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.join_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the loop and waits for the in-flight cycle to finish.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.join_handle.take() {
            handle.await.context("alert scheduler join failed")?;
        }
        Ok(())
    }
}

impl Drop for AlertSchedulerHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            handle.abort();
        }
    }
}

pub struct AlertScheduler {
    engine: Arc<AlertEngine>,
    board: Arc<AlertBoard>,
    config: AlertSchedulerConfig,
}

impl AlertScheduler {
    pub fn new(engine: Arc<AlertEngine>, board: Arc<AlertBoard>, config: AlertSchedulerConfig) -> Self {
        Self { engine, board, config }
    }

    /// Subscribes to both stores, then spawns the loop. The subscriptions
    /// are taken before the first cycle so no change can slip in between.
    ///
    /// The stores may share one backend; each receiver only acts on its own
    /// key so a shared event still yields a single cycle.
    pub fn start(self: Arc<Self>) -> AlertSchedulerHandle {
        let (refresh_tx, mut refresh_rx) = mpsc::channel(self.config.refresh_buffer.max(1));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let mut offer_events = Some(self.engine.offer_store().subscribe());
        let mut settings_events = Some(self.engine.settings_store().subscribe());

        let scheduler = Arc::clone(&self);
        let join_handle = tokio::spawn(async move {
            let period = scheduler.config.refresh_interval;
            info!(refresh_interval = ?period, "alert scheduler started");

            scheduler.run_cycle(Trigger::Startup).await;

            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        info!("alert scheduler shutdown requested");
                        break;
                    }
                    _ = ticker.tick() => {
                        scheduler.run_cycle(Trigger::Interval).await;
                    }
                    maybe = refresh_rx.recv() => {
                        match maybe {
                            Some(()) => scheduler.run_cycle(Trigger::Manual).await,
                            // every handle is gone; Drop has already aborted us
                            None => break,
                        }
                    }
                    received = recv_event(&mut offer_events), if offer_events.is_some() => {
                        if !scheduler.on_storage_event(received, OFFERS_KEY).await {
                            offer_events = None;
                        }
                    }
                    received = recv_event(&mut settings_events), if settings_events.is_some() => {
                        if !scheduler.on_storage_event(received, ALERT_SETTINGS_KEY).await {
                            settings_events = None;
                        }
                    }
                }
            }

            info!("alert scheduler stopped");
        });

        AlertSchedulerHandle {
            refresh_tx,
            shutdown_tx: Some(shutdown_tx),
            join_handle: Some(join_handle),
        }
    }

    /// Reacts to one notification from a store channel. Returns `false` once
    /// that channel is closed.
    async fn on_storage_event(
        &self,
        received: Result<StorageEvent, broadcast::error::RecvError>,
        key: &str,
    ) -> bool {
        match received {
            Ok(event) if event.key == key => {
                debug!(key = %event.key, origin = ?event.origin, "storage change");
                self.run_cycle(Trigger::StorageChange(event.key)).await;
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, key, "storage change notifications lagged");
                self.run_cycle(Trigger::MissedChanges(missed)).await;
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!(key, "storage change channel closed; interval refresh only");
                return false;
            }
        }
        true
    }

    /// Evaluates and publishes. The engine never fails, so neither does this.
    pub async fn run_cycle(&self, trigger: Trigger) {
        let now = Utc::now();
        let alerts = self.engine.evaluate_at(now).await;
        let urgent = alerts.iter().filter(|a| a.is_urgent).count();
        let total = alerts.len();
        self.board.publish(alerts, now);
        info!(trigger = %trigger, alerts = total, urgent, "alerts refreshed");
    }
}

async fn recv_event(
    events: &mut Option<broadcast::Receiver<StorageEvent>>,
) -> Result<StorageEvent, broadcast::error::RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        // guarded by `if events.is_some()` in the select
        None => std::future::pending().await,
    }
}
