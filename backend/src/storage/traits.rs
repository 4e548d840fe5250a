//! # Storage Traits
//!
//! This module defines the storage abstraction that lets the domain layer
//! work against any document store: the hosted database in production or the
//! in-memory connection in tests and local runs.

use async_trait::async_trait;

use super::document::{BatchWrite, Document, DocumentPath, Fields, Query};
use super::error::StoreResult;

/// A standing query that yields the full result set each time it changes.
///
/// The first call to `next_snapshot` returns the current result set. Later
/// calls wait for a change in the watched collection. An error ends the
/// listener; `None` means it is closed.
#[async_trait]
pub trait SnapshotListener: Send {
    /// Wait for the next full snapshot
    async fn next_snapshot(&mut self) -> Option<StoreResult<Vec<Document>>>;

    /// Release the listener. Calling it again is a no-op.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

/// Trait defining the interface for document store operations
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Retrieve a single document
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Document>>;

    /// Run a filtered, ordered query against a collection.
    /// Fails with `StoreError::FailedPrecondition` when a required index is missing.
    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>>;

    /// Open a live query on a collection
    fn subscribe(&self, collection: &str, query: Query) -> Box<dyn SnapshotListener>;

    /// Create the document if absent, otherwise overwrite only the given fields
    async fn set_merge(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()>;

    /// Create a document under a store-generated id and return that id
    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String>;

    /// Apply several merge-upserts atomically: all of them or none
    async fn batch_write(&self, writes: Vec<BatchWrite>) -> StoreResult<()>;
}
