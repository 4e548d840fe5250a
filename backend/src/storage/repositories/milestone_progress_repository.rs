//! # Milestone Progress Repository
//!
//! Per-child progress lives in the `children/{child_id}/milestoneProgress`
//! subcollection. Each record is stored under its milestone's template id.
//!
//! Status writes are merge-upserts of `{milestoneId, status, dateAchieved}`
//! only, so notes attached to a record survive any number of status changes.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{format_timestamp, parse_timestamp, ProgressSubscription, RecordSubscription};
use crate::config::CollectionNames;
use crate::domain::models::{MilestoneProgress, MilestoneStatus, StatusUpdate};
use crate::storage::document::{encode_fields, BatchWrite, Document, DocumentPath, Fields, Query};
use crate::storage::error::StoreResult;
use crate::storage::traits::DocumentStore;

/// Stored shape of a progress document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressRecord {
    #[serde(default)]
    milestone_id: Option<String>,
    /// A record holding only notes has never had a status set
    #[serde(default)]
    status: MilestoneStatus,
    #[serde(default)]
    date_achieved: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// Fields written by a status change. `date_achieved` serializes as null
/// rather than being skipped so a downgrade clears the old date.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusRecord {
    milestone_id: String,
    status: MilestoneStatus,
    date_achieved: Option<String>,
}

impl From<&StatusUpdate> for StatusRecord {
    fn from(update: &StatusUpdate) -> Self {
        StatusRecord {
            milestone_id: update.milestone_id.clone(),
            status: update.status,
            date_achieved: update.date_achieved.as_ref().map(format_timestamp),
        }
    }
}

fn decode_progress(document: &Document, collection: &str) -> StoreResult<MilestoneProgress> {
    let record: ProgressRecord = document.decode(collection)?;
    let date_achieved = match record.date_achieved.as_deref() {
        Some(raw) => Some(parse_timestamp(raw, "dateAchieved", document, collection)?),
        None => None,
    };

    Ok(MilestoneProgress {
        milestone_id: record.milestone_id.unwrap_or_else(|| document.id.clone()),
        status: record.status,
        date_achieved,
        notes: record.notes,
    })
}

#[derive(Clone)]
pub struct MilestoneProgressRepository {
    store: Arc<dyn DocumentStore>,
    collections: CollectionNames,
}

impl MilestoneProgressRepository {
    pub fn new(store: Arc<dyn DocumentStore>, collections: &CollectionNames) -> Self {
        Self {
            store,
            collections: collections.clone(),
        }
    }

    fn path(&self, child_id: &str, milestone_id: &str) -> DocumentPath {
        DocumentPath::new(self.collections.progress_collection(child_id), milestone_id)
    }

    /// Live view of every progress record for one child.
    /// Snapshot order is unspecified; the merge re-keys by milestone id.
    pub fn observe(&self, child_id: &str) -> ProgressSubscription {
        let collection = self.collections.progress_collection(child_id);
        debug!("Observing progress at {}", collection);
        let listener = self.store.subscribe(&collection, Query::new());
        RecordSubscription::new(listener, collection, decode_progress)
    }

    pub async fn get_progress(
        &self,
        child_id: &str,
        milestone_id: &str,
    ) -> StoreResult<Option<MilestoneProgress>> {
        let path = self.path(child_id, milestone_id);
        match self.store.get(&path).await? {
            Some(document) => decode_progress(&document, &path.collection).map(Some),
            None => Ok(None),
        }
    }

    pub async fn upsert_status(&self, child_id: &str, update: &StatusUpdate) -> StoreResult<()> {
        let fields = encode_fields(&StatusRecord::from(update))?;
        self.store
            .set_merge(&self.path(child_id, &update.milestone_id), fields)
            .await?;
        info!(
            "Set milestone {} to '{}' for child {}",
            update.milestone_id, update.status, child_id
        );
        Ok(())
    }

    /// Apply several status changes in one atomic batch
    pub async fn upsert_statuses(&self, child_id: &str, updates: &[StatusUpdate]) -> StoreResult<()> {
        let mut writes = Vec::with_capacity(updates.len());
        for update in updates {
            writes.push(BatchWrite {
                path: self.path(child_id, &update.milestone_id),
                fields: encode_fields(&StatusRecord::from(update))?,
            });
        }
        self.store.batch_write(writes).await?;
        info!("Committed {} status updates for child {}", updates.len(), child_id);
        Ok(())
    }

    /// Replace the notes on a record, leaving status untouched
    pub async fn update_notes(
        &self,
        child_id: &str,
        milestone_id: &str,
        notes: Option<&str>,
    ) -> StoreResult<()> {
        let mut fields = Fields::new();
        fields.insert("milestoneId".to_string(), milestone_id.into());
        fields.insert("notes".to_string(), notes.map(str::to_string).into());
        self.store.set_merge(&self.path(child_id, milestone_id), fields).await
    }
}
