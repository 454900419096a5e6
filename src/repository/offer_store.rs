// src/repository/offer_store.rs
//! Offer collection access.
//!
//! The collection is owned by the BMS forms; the alert engine reads whole
//! snapshots. Write helpers exist for the hosting application and tests and
//! go through the key/value store, so every write is announced to subscribers.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tokio::sync::broadcast;

use crate::domain::error::{AlertingError, ErrorContext};
use crate::domain::model::offer::Offer;
use crate::repository::kv_store::{ChangeOrigin, KeyValueStore, StorageEvent, OFFERS_KEY};

/// Offers read in one go, plus the records that had to be skipped.
#[derive(Debug, Default)]
pub struct OfferSnapshot {
    pub offers: Vec<Offer>,
    pub skipped: Vec<AlertingError>,
}

/// Parses the persisted collection. The document must be a JSON array;
/// elements that are not offers are skipped and reported individually.
pub fn parse_offer_collection(raw: &str) -> Result<OfferSnapshot, AlertingError> {
    let value: JsonValue =
        serde_json::from_str(raw).map_err(|e| AlertingError::MalformedOfferCollection {
            message: e.to_string(),
            context: ErrorContext::for_key(OFFERS_KEY),
        })?;
    let items = match value {
        JsonValue::Array(items) => items,
        other => {
            return Err(AlertingError::MalformedOfferCollection {
                message: format!("expected an array, found {}", json_kind(&other)),
                context: ErrorContext::for_key(OFFERS_KEY),
            })
        }
    };

    let mut snapshot = OfferSnapshot::default();
    for (index, item) in items.into_iter().enumerate() {
        let id = item.get("id").and_then(JsonValue::as_i64);
        match serde_json::from_value::<Offer>(item) {
            Ok(offer) => snapshot.offers.push(offer),
            Err(e) => snapshot.skipped.push(AlertingError::MalformedOfferRecord {
                index,
                message: e.to_string(),
                context: ErrorContext::new(id, None, Some(OFFERS_KEY)),
            }),
        }
    }
    Ok(snapshot)
}

fn json_kind(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[derive(Clone)]
pub struct OfferStore {
    kv: Arc<dyn KeyValueStore>,
}

impl OfferStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Whole-collection snapshot. An absent key is an empty collection.
    pub async fn load_offers(&self) -> Result<OfferSnapshot, AlertingError> {
        let raw = self
            .kv
            .get(OFFERS_KEY)
            .await
            .map_err(|e| AlertingError::storage(e, OFFERS_KEY))?;
        match raw {
            Some(raw) => parse_offer_collection(&raw),
            None => Ok(OfferSnapshot::default()),
        }
    }

    pub async fn replace_all(&self, offers: &[Offer]) -> Result<(), AlertingError> {
        let body = serde_json::to_string(offers)
            .map_err(|e| AlertingError::storage(e.into(), OFFERS_KEY))?;
        self.kv
            .set(OFFERS_KEY, body, ChangeOrigin::App)
            .await
            .map_err(|e| AlertingError::storage(e, OFFERS_KEY))
    }

    /// Inserts or replaces the offer with the same id. Refuses to write over
    /// an unreadable collection.
    pub async fn upsert_offer(&self, offer: Offer) -> Result<(), AlertingError> {
        let mut offers = self.load_offers().await?.offers;
        match offers.iter_mut().find(|o| o.id == offer.id) {
            Some(existing) => *existing = offer,
            None => offers.push(offer),
        }
        self.replace_all(&offers).await
    }

    /// Returns whether an offer was removed.
    pub async fn remove_offer(&self, id: i64) -> Result<bool, AlertingError> {
        let mut offers = self.load_offers().await?.offers;
        let before = offers.len();
        offers.retain(|o| o.id != id);
        if offers.len() == before {
            return Ok(false);
        }
        self.replace_all(&offers).await?;
        Ok(true)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.kv.subscribe()
    }
}
