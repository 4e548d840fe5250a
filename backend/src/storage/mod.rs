//! # Storage Module
//!
//! Handles all data persistence for the milestone tracker.
//!
//! The domain layer talks to a hosted document store through the
//! [`DocumentStore`] trait; this module defines that seam, the in-memory
//! implementation used locally and in tests, and the repositories that map
//! stored documents to domain models.
//!
//! ## Layout
//!
//! - **document**: documents, queries, index declarations, batch writes
//! - **traits**: the `DocumentStore` and `SnapshotListener` abstractions
//! - **memory**: in-memory connection with change notifications
//! - **repositories**: typed access to children, templates, progress, behaviors
//!
//! ## Collection Layout
//!
//! ```text
//! children/{child_id}
//! children/{child_id}/milestoneProgress/{milestone_id}
//! milestoneTemplates/{template_id}
//! behaviors/{behavior_id}
//! ```

pub mod document;
pub mod error;
pub mod memory;
pub mod repositories;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

pub use document::{BatchWrite, CompositeIndex, Direction, Document, DocumentPath, Fields, FilterOp, Query};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryConnection;
pub use repositories::{
    BehaviorRepository, BehaviorSubscription, ChildRepository, ChildSubscription,
    MilestoneProgressRepository,
    MilestoneTemplateRepository, ProgressSubscription,
};
pub use traits::{DocumentStore, SnapshotListener};
