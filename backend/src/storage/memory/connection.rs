//! # In-Memory Connection
//!
//! A process-local document store with the behavior the domain layer relies
//! on from the hosted store:
//!
//! - merge-upserts that never touch fields they don't name
//! - atomic batches, staged on a copy and swapped in under one lock
//! - change notifications that wake live listeners
//! - composite-index enforcement, so missing-index failures can be exercised
//!
//! Collections are keyed by their full slash path; documents inside a
//! collection are kept in id order.

use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::listener::MemorySnapshotListener;
use crate::config::{CollectionNames, StoreSettings};
use crate::storage::document::{
    collection_group, BatchWrite, CompositeIndex, Document, DocumentPath, Fields, Query,
};
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::traits::{DocumentStore, SnapshotListener};

type Collections = HashMap<String, BTreeMap<String, Fields>>;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

struct Inner {
    collections: Mutex<Collections>,
    changes: broadcast::Sender<String>,
    enforce_indexes: bool,
    indexes: Mutex<Vec<CompositeIndex>>,
    active_listeners: Arc<AtomicUsize>,
    offline: AtomicBool,
    batch_fault: Mutex<Option<usize>>,
}

/// MemoryConnection owns the documents and the change feed. Clones share state.
#[derive(Clone)]
pub struct MemoryConnection {
    inner: Arc<Inner>,
}

impl MemoryConnection {
    /// Create a connection that accepts every query without index checks
    pub fn new() -> Self {
        Self::build(false, Vec::new())
    }

    /// Create a connection using configured index settings. Without an
    /// explicit index list, the tracker's indexes on `collections` are provisioned.
    pub fn with_settings(settings: &StoreSettings, collections: &CollectionNames) -> Self {
        let indexes = settings.resolved_indexes(collections);
        info!(
            "Opening in-memory document store (enforce_indexes={}, {} indexes)",
            settings.enforce_indexes,
            indexes.len()
        );
        Self::build(settings.enforce_indexes, indexes)
    }

    fn build(enforce_indexes: bool, indexes: Vec<CompositeIndex>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                collections: Mutex::new(HashMap::new()),
                changes,
                enforce_indexes,
                indexes: Mutex::new(indexes),
                active_listeners: Arc::new(AtomicUsize::new(0)),
                offline: AtomicBool::new(false),
                batch_fault: Mutex::new(None),
            }),
        }
    }

    /// Register a composite index so queries that need it stop failing
    pub fn provision_index(&self, index: CompositeIndex) -> StoreResult<()> {
        let mut indexes = lock(&self.inner.indexes)?;
        if !indexes.contains(&index) {
            info!("Provisioned index on {}", index);
            indexes.push(index);
        }
        Ok(())
    }

    /// Number of listeners that have not been closed yet
    pub fn active_listeners(&self) -> usize {
        self.inner.active_listeners.load(Ordering::SeqCst)
    }

    /// Simulate a network outage: every operation fails with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Make the next batch fail after staging `writes` of its operations
    pub fn fail_next_batch_after(&self, writes: usize) {
        if let Ok(mut fault) = self.inner.batch_fault.lock() {
            *fault = Some(writes);
        }
    }

    /// Total number of documents in one collection
    pub fn document_count(&self, collection: &str) -> usize {
        lock(&self.inner.collections)
            .map(|collections| collections.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(String::from("store is offline")));
        }
        Ok(())
    }

    fn check_index(&self, collection: &str, query: &Query) -> StoreResult<()> {
        if !self.inner.enforce_indexes {
            return Ok(());
        }
        let fields = query.index_fields();
        if fields.len() <= 1 {
            return Ok(());
        }

        let required = CompositeIndex {
            collection_group: collection_group(collection).to_string(),
            fields,
        };
        if lock(&self.inner.indexes)?.contains(&required) {
            Ok(())
        } else {
            warn!("Query on {} rejected: missing index {}", collection, required);
            Err(StoreError::FailedPrecondition { index: required })
        }
    }

    /// Execute a query now. Used by `query` and by live listeners.
    pub(crate) fn run_query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        self.ensure_online()?;
        self.check_index(collection, query)?;

        let collections = lock(&self.inner.collections)?;
        let mut documents: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| query.matches(fields))
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        drop(collections);

        documents.sort_by(|a, b| query.compare(a, b));
        Ok(documents)
    }

    fn notify(&self, collection: &str) {
        // No receivers is fine: nobody is watching.
        let _ = self.inner.changes.send(collection.to_string());
    }
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable(String::from("store lock poisoned")))
}

fn merge_into(target: &mut Fields, fields: Fields) {
    for (key, value) in fields {
        target.insert(key, value);
    }
}

#[async_trait]
impl DocumentStore for MemoryConnection {
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        self.ensure_online()?;
        let collections = lock(&self.inner.collections)?;
        Ok(collections
            .get(&path.collection)
            .and_then(|docs| docs.get(&path.id))
            .map(|fields| Document::new(path.id.clone(), fields.clone())))
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        let documents = self.run_query(collection, query)?;
        debug!("Query on {} returned {} documents", collection, documents.len());
        Ok(documents)
    }

    fn subscribe(&self, collection: &str, query: Query) -> Box<dyn SnapshotListener> {
        let changes = self.inner.changes.subscribe();
        let active = self.inner.active_listeners.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Opened listener on {} ({} active)", collection, active);
        Box::new(MemorySnapshotListener::new(
            self.clone(),
            collection.to_string(),
            query,
            changes,
            Arc::clone(&self.inner.active_listeners),
        ))
    }

    async fn set_merge(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        self.ensure_online()?;
        {
            let mut collections = lock(&self.inner.collections)?;
            let document = collections
                .entry(path.collection.clone())
                .or_default()
                .entry(path.id.clone())
                .or_default();
            merge_into(document, fields);
        }
        debug!("Upserted {}", path);
        self.notify(&path.collection);
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        self.ensure_online()?;
        let id = Uuid::new_v4().simple().to_string();
        lock(&self.inner.collections)?
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        debug!("Added {}/{}", collection, id);
        self.notify(collection);
        Ok(id)
    }

    async fn batch_write(&self, writes: Vec<BatchWrite>) -> StoreResult<()> {
        self.ensure_online()?;
        let fault = lock(&self.inner.batch_fault)?.take();
        let write_count = writes.len();

        let touched: BTreeSet<String> = {
            let mut collections = lock(&self.inner.collections)?;
            let mut staged: HashMap<String, BTreeMap<String, Fields>> = HashMap::new();

            for (position, write) in writes.into_iter().enumerate() {
                if fault == Some(position) {
                    warn!("Batch aborted after {} of {} writes", position, write_count);
                    return Err(StoreError::Unavailable(format!(
                        "batch aborted after {} writes",
                        position
                    )));
                }
                let collection = staged
                    .entry(write.path.collection.clone())
                    .or_insert_with(|| {
                        collections
                            .get(&write.path.collection)
                            .cloned()
                            .unwrap_or_default()
                    });
                merge_into(collection.entry(write.path.id).or_default(), write.fields);
            }

            let touched = staged.keys().cloned().collect();
            collections.extend(staged);
            touched
        };

        debug!("Committed batch of {} writes", write_count);
        for collection in &touched {
            self.notify(collection);
        }
        Ok(())
    }
}
