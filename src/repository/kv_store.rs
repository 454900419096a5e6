// src/repository/kv_store.rs
//! Key/value persistence with change notification.
//!
//! Models the browser local storage the BMS front-end keeps its data in:
//! string keys, string (JSON) values, and a broadcast of every change so
//! that readers elsewhere can react, like the `storage` event between tabs.
//!
//! Implementations:
//! - `InMemoryKeyValueStore` for tests and local dev.
//! - `FileKeyValueStore`, one JSON document on disk, written atomically.

use async_trait::async_trait;
use anyhow::Context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Key holding the offer collection (JSON array).
pub const OFFERS_KEY: &str = "offres";
/// Key holding the alert settings (JSON object).
pub const ALERT_SETTINGS_KEY: &str = "alertSettings";

const EVENT_BUFFER: usize = 64;

/// Who made a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// This process (e.g. the user saving settings).
    App,
    /// Another writer: a second tab, another process editing the file.
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub origin: ChangeOrigin,
}

#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Stores `value` and broadcasts a [`StorageEvent`] once it is durable.
    async fn set(&self, key: &str, value: String, origin: ChangeOrigin) -> anyhow::Result<()>;

    async fn remove(&self, key: &str, origin: ChangeOrigin) -> anyhow::Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

fn notify(events: &broadcast::Sender<StorageEvent>, key: &str, origin: ChangeOrigin) {
    // No subscriber is not an error.
    let _ = events.send(StorageEvent {
        key: key.to_string(),
        origin,
    });
}

/// --------------------
/// In-memory implementation
/// --------------------
pub struct InMemoryKeyValueStore {
    items: Arc<RwLock<HashMap<String, String>>>,
    events: broadcast::Sender<StorageEvent>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::with_entries(HashMap::new())
    }

    pub fn with_entries(initial: HashMap<String, String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            items: Arc::new(RwLock::new(initial)),
            events,
        }
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String, origin: ChangeOrigin) -> anyhow::Result<()> {
        self.items.write().await.insert(key.to_string(), value);
        notify(&self.events, key, origin);
        Ok(())
    }

    async fn remove(&self, key: &str, origin: ChangeOrigin) -> anyhow::Result<()> {
        let removed = self.items.write().await.remove(key).is_some();
        if removed {
            notify(&self.events, key, origin);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

/// --------------------
/// File-backed implementation
/// --------------------
///
/// The whole map lives in one JSON object on disk. Writes go to a sibling
/// temp file that is then renamed over the document, so readers never see
/// half a file. [`FileKeyValueStore::reload`] picks up edits made by other
/// processes and announces them as [`ChangeOrigin::External`].
pub struct FileKeyValueStore {
    path: PathBuf,
    items: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl FileKeyValueStore {
    /// Opens the document at `path`. A missing file is an empty store; an
    /// unreadable one is logged and also treated as empty.
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating storage directory {}", parent.display()))?;
        }
        let items = match read_document(&path).await? {
            Some(bytes) => parse_document(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "storage document unreadable; starting empty");
                HashMap::new()
            }),
            None => HashMap::new(),
        };
        info!(path = %path.display(), keys = items.len(), "file storage opened");
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Ok(Self {
            path,
            items: RwLock::new(items),
            events,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the document and broadcasts one external event per key whose
    /// value changed. Returns the changed keys.
    ///
    /// A document that does not parse (e.g. caught mid-write by another
    /// process) is an error and the current contents are kept; a deleted
    /// file reads as empty.
    pub async fn reload(&self) -> anyhow::Result<Vec<String>> {
        let fresh = match read_document(&self.path).await? {
            Some(bytes) => parse_document(&bytes).with_context(|| {
                format!("storage document {} unreadable; keeping current contents", self.path.display())
            })?,
            None => HashMap::new(),
        };
        let mut items = self.items.write().await;

        let mut changed: Vec<String> = fresh
            .iter()
            .filter(|(k, v)| items.get(*k) != Some(*v))
            .map(|(k, _)| k.clone())
            .collect();
        changed.extend(items.keys().filter(|k| !fresh.contains_key(*k)).cloned());
        changed.sort();

        *items = fresh;
        drop(items);

        for key in &changed {
            notify(&self.events, key, ChangeOrigin::External);
        }
        if !changed.is_empty() {
            debug!(keys = ?changed, "external storage changes picked up");
        }
        Ok(changed)
    }

    async fn persist(&self, items: &HashMap<String, String>) -> anyhow::Result<()> {
        let body = serde_json::to_vec_pretty(items).context("serializing storage document")?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

/// Raw document bytes, `None` when the file does not exist.
async fn read_document(path: &Path) -> anyhow::Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(b) => Ok(Some(b)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

fn parse_document(bytes: &[u8]) -> serde_json::Result<HashMap<String, String>> {
    serde_json::from_slice(bytes)
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String, origin: ChangeOrigin) -> anyhow::Result<()> {
        let mut items = self.items.write().await;
        let previous = items.insert(key.to_string(), value);
        if let Err(e) = self.persist(&items).await {
            // keep memory and disk in agreement
            match previous {
                Some(p) => items.insert(key.to_string(), p),
                None => items.remove(key),
            };
            return Err(e);
        }
        drop(items);
        notify(&self.events, key, origin);
        Ok(())
    }

    async fn remove(&self, key: &str, origin: ChangeOrigin) -> anyhow::Result<()> {
        let mut items = self.items.write().await;
        let Some(previous) = items.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(&items).await {
            items.insert(key.to_string(), previous);
            return Err(e);
        }
        drop(items);
        notify(&self.events, key, origin);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
