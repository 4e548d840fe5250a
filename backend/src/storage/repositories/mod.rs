//! Typed repositories over the document store.
//!
//! Each repository owns the document layout of one collection: the record
//! struct that is actually stored, and the conversion to and from the domain
//! model. Records that fail to decode are skipped with a warning rather than
//! failing a whole listing.

pub mod behavior_repository;
pub mod child_repository;
pub mod milestone_progress_repository;
pub mod milestone_template_repository;

use chrono::{DateTime, SecondsFormat, Utc};
use log::warn;

use super::document::Document;
use super::error::{StoreError, StoreResult};
use super::traits::SnapshotListener;
use crate::domain::models::{BehaviorLog, Child, MilestoneProgress};

pub use behavior_repository::BehaviorRepository;
pub use child_repository::ChildRepository;
pub use milestone_progress_repository::MilestoneProgressRepository;
pub use milestone_template_repository::MilestoneTemplateRepository;

type Decoder<T> = fn(&Document, &str) -> StoreResult<T>;

/// Stored timestamp format. Fixed width in UTC, so string order is time order.
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(
    raw: &str,
    field: &str,
    document: &Document,
    collection: &str,
) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidDocument {
            path: format!("{}/{}", collection, document.id),
            reason: format!("bad {}: {}", field, e),
        })
}

/// Decode every document, dropping (and logging) the ones that don't parse
fn decode_all<T>(documents: &[Document], collection: &str, decode: Decoder<T>) -> Vec<T> {
    documents
        .iter()
        .filter_map(|document| match decode(document, collection) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Failed to parse record {}/{}: {}. Skipping.", collection, document.id, e);
                None
            }
        })
        .collect()
}

/// A live query whose snapshots are decoded into domain records
pub struct RecordSubscription<T> {
    listener: Box<dyn SnapshotListener>,
    collection: String,
    decode: Decoder<T>,
}

impl<T> RecordSubscription<T> {
    fn new(listener: Box<dyn SnapshotListener>, collection: String, decode: Decoder<T>) -> Self {
        Self {
            listener,
            collection,
            decode,
        }
    }

    /// Wait for the next full snapshot; `None` once the subscription is closed
    pub async fn next(&mut self) -> Option<StoreResult<Vec<T>>> {
        let snapshot = self.listener.next_snapshot().await?;
        Some(snapshot.map(|documents| decode_all(&documents, &self.collection, self.decode)))
    }

    pub fn close(&mut self) {
        self.listener.close();
    }

    pub fn is_closed(&self) -> bool {
        self.listener.is_closed()
    }
}

pub type ProgressSubscription = RecordSubscription<MilestoneProgress>;
pub type BehaviorSubscription = RecordSubscription<BehaviorLog>;
pub type ChildSubscription = RecordSubscription<Child>;
