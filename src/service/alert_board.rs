// src/service/alert_board.rs
//! Published alert list with visibility and per-alert dismissal.
//!
//! The board is the single place the scheduler publishes to. Consumers
//! subscribe to a `watch` channel and always see a whole snapshot.
//! Dismissal only edits the current snapshot: the next publish brings the
//! alert back if its deadline condition still holds.

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::domain::model::alert::DeadlineAlert;

#[derive(Debug, Clone, PartialEq)]
pub struct AlertSnapshot {
    pub alerts: Vec<DeadlineAlert>,
    pub is_visible: bool,
    /// `None` until the first evaluation completes.
    pub generated_at: Option<DateTime<Utc>>,
    /// Number of evaluations published so far.
    pub revision: u64,
}

impl Default for AlertSnapshot {
    fn default() -> Self {
        Self {
            alerts: Vec::new(),
            is_visible: true,
            generated_at: None,
            revision: 0,
        }
    }
}

impl AlertSnapshot {
    /// What a dashboard should render: nothing while hidden.
    pub fn visible_alerts(&self) -> &[DeadlineAlert] {
        if self.is_visible {
            &self.alerts
        } else {
            &[]
        }
    }

    pub fn urgent_count(&self) -> usize {
        self.alerts.iter().filter(|a| a.is_urgent).count()
    }

    pub fn expired_count(&self) -> usize {
        self.alerts.iter().filter(|a| a.is_expired).count()
    }

    pub fn contains(&self, alert_id: &str) -> bool {
        self.alerts.iter().any(|a| a.id == alert_id)
    }
}

pub struct AlertBoard {
    tx: watch::Sender<AlertSnapshot>,
}

impl Default for AlertBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertBoard {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AlertSnapshot::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<AlertSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> AlertSnapshot {
        self.tx.borrow().clone()
    }

    /// Replaces the alert list wholesale; earlier dismissals are forgotten.
    pub fn publish(&self, alerts: Vec<DeadlineAlert>, generated_at: DateTime<Utc>) {
        self.tx.send_modify(|s| {
            s.alerts = alerts;
            s.generated_at = Some(generated_at);
            s.revision += 1;
        });
    }

    /// Removes one alert from the current list. Returns whether it was shown.
    pub fn dismiss(&self, alert_id: &str) -> bool {
        self.tx.send_if_modified(|s| {
            let before = s.alerts.len();
            s.alerts.retain(|a| a.id != alert_id);
            s.alerts.len() != before
        })
    }

    pub fn set_visible(&self, visible: bool) {
        self.tx.send_if_modified(|s| {
            let changed = s.is_visible != visible;
            s.is_visible = visible;
            changed
        });
    }

    /// Returns the new visibility.
    pub fn toggle_visibility(&self) -> bool {
        let mut now_visible = true;
        self.tx.send_modify(|s| {
            s.is_visible = !s.is_visible;
            now_visible = s.is_visible;
        });
        now_visible
    }
}
