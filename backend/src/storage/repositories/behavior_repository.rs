//! # Behavior Repository
//!
//! Behavior logs are stored flat in the `behaviors` collection with the child
//! and parent ids on every document. Listing is scoped to both ids and ordered
//! by timestamp, which needs the (childId, parentId, timestamp) composite index.

use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{decode_all, format_timestamp, parse_timestamp, BehaviorSubscription, RecordSubscription};
use crate::config::CollectionNames;
use crate::domain::models::BehaviorLog;
use crate::storage::document::{encode_fields, Direction, Document, FilterOp, Query};
use crate::storage::error::StoreResult;
use crate::storage::traits::DocumentStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BehaviorRecord {
    child_id: String,
    parent_id: String,
    #[serde(rename = "type")]
    behavior_type: String,
    #[serde(default)]
    mood: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    location: String,
    timestamp: String,
}

impl From<&BehaviorLog> for BehaviorRecord {
    fn from(log: &BehaviorLog) -> Self {
        BehaviorRecord {
            child_id: log.child_id.clone(),
            parent_id: log.parent_id.clone(),
            behavior_type: log.behavior_type.clone(),
            mood: log.mood.clone(),
            notes: log.notes.clone(),
            location: log.location.clone(),
            timestamp: format_timestamp(&log.timestamp),
        }
    }
}

fn decode_behavior(document: &Document, collection: &str) -> StoreResult<BehaviorLog> {
    let record: BehaviorRecord = document.decode(collection)?;
    let timestamp = parse_timestamp(&record.timestamp, "timestamp", document, collection)?;
    Ok(BehaviorLog {
        id: document.id.clone(),
        child_id: record.child_id,
        parent_id: record.parent_id,
        behavior_type: record.behavior_type,
        mood: record.mood,
        notes: record.notes,
        location: record.location,
        timestamp,
    })
}

#[derive(Clone)]
pub struct BehaviorRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl BehaviorRepository {
    pub fn new(store: Arc<dyn DocumentStore>, collections: &CollectionNames) -> Self {
        Self {
            store,
            collection: collections.behaviors.clone(),
        }
    }

    fn scoped_query(child_id: &str, parent_id: &str) -> Query {
        Query::new()
            .filter("childId", FilterOp::Eq, child_id)
            .filter("parentId", FilterOp::Eq, parent_id)
            .order_by("timestamp", Direction::Asc)
    }

    /// Record a new log. The incoming id is ignored; the returned log carries
    /// the id the store assigned.
    pub async fn store_behavior(&self, log: BehaviorLog) -> StoreResult<BehaviorLog> {
        let fields = encode_fields(&BehaviorRecord::from(&log))?;
        let id = self.store.add(&self.collection, fields).await?;
        info!("Logged behavior '{}' for child {} as {}", log.behavior_type, log.child_id, id);
        Ok(BehaviorLog { id, ..log })
    }

    pub fn observe(&self, child_id: &str, parent_id: &str) -> BehaviorSubscription {
        let listener = self
            .store
            .subscribe(&self.collection, Self::scoped_query(child_id, parent_id));
        RecordSubscription::new(listener, self.collection.clone(), decode_behavior)
    }

    /// One-shot read of the same result set `observe` yields
    pub async fn list_behaviors(&self, child_id: &str, parent_id: &str) -> StoreResult<Vec<BehaviorLog>> {
        let documents = self
            .store
            .query(&self.collection, &Self::scoped_query(child_id, parent_id))
            .await?;
        Ok(decode_all(&documents, &self.collection, decode_behavior))
    }
}
