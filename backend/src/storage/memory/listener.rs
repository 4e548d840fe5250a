use async_trait::async_trait;
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use super::connection::MemoryConnection;
use crate::storage::document::{Document, Query};
use crate::storage::error::StoreResult;
use crate::storage::traits::SnapshotListener;

/// Decrements the connection's listener count when dropped
struct ListenerGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Live query over a `MemoryConnection` collection.
///
/// Polled lazily: nothing runs in the background, a snapshot is computed when
/// the owner asks for the next one.
pub struct MemorySnapshotListener {
    connection: MemoryConnection,
    collection: String,
    query: Query,
    changes: Option<broadcast::Receiver<String>>,
    delivered_initial: bool,
    guard: Option<ListenerGuard>,
}

impl MemorySnapshotListener {
    pub(crate) fn new(
        connection: MemoryConnection,
        collection: String,
        query: Query,
        changes: broadcast::Receiver<String>,
        active: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            connection,
            collection,
            query,
            changes: Some(changes),
            delivered_initial: false,
            guard: Some(ListenerGuard { active }),
        }
    }
}

/// Wait until the watched collection changes. Returns false once the feed is gone.
async fn wait_for_change(changes: &mut broadcast::Receiver<String>, collection: &str) -> bool {
    loop {
        match changes.recv().await {
            Ok(changed) if changed == collection => return true,
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                // Snapshots are full result sets, so re-reading covers anything missed
                debug!("Listener on {} lagged by {} events", collection, skipped);
                return true;
            }
            Err(RecvError::Closed) => return false,
        }
    }
}

#[async_trait]
impl SnapshotListener for MemorySnapshotListener {
    async fn next_snapshot(&mut self) -> Option<StoreResult<Vec<Document>>> {
        if self.delivered_initial {
            let changes = self.changes.as_mut()?;
            if !wait_for_change(changes, &self.collection).await {
                self.close();
                return None;
            }
        } else if self.guard.is_none() {
            return None;
        }
        self.delivered_initial = true;

        match self.connection.run_query(&self.collection, &self.query) {
            Ok(documents) => Some(Ok(documents)),
            Err(e) => {
                self.close();
                Some(Err(e))
            }
        }
    }

    fn close(&mut self) {
        self.changes = None;
        if self.guard.take().is_some() {
            debug!("Closed listener on {}", self.collection);
        }
    }

    fn is_closed(&self) -> bool {
        self.guard.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::document::{DocumentPath, Fields};
    use crate::storage::traits::DocumentStore;
    use serde_json::json;

    fn status_fields(status: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("status".to_string(), json!(status));
        fields
    }

    #[tokio::test]
    async fn test_listener_emits_initial_and_changed_snapshots() {
        let conn = MemoryConnection::new();
        let collection = "children/c1/milestoneProgress";
        let mut listener = conn.subscribe(collection, Query::new());

        let initial = listener.next_snapshot().await.unwrap().unwrap();
        assert!(initial.is_empty());

        conn.set_merge(&DocumentPath::new(collection, "m1"), status_fields("Achieved"))
            .await
            .unwrap();
        let updated = listener.next_snapshot().await.unwrap().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, "m1");
    }

    #[tokio::test]
    async fn test_listener_ignores_other_collections() {
        let conn = MemoryConnection::new();
        let mut listener = conn.subscribe("children/c1/milestoneProgress", Query::new());
        listener.next_snapshot().await.unwrap().unwrap();

        conn.set_merge(
            &DocumentPath::new("children/c2/milestoneProgress", "m1"),
            status_fields("Achieved"),
        )
        .await
        .unwrap();

        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            listener.next_snapshot(),
        )
        .await;
        assert!(pending.is_err(), "no snapshot expected for an unrelated collection");
    }

    #[tokio::test]
    async fn test_close_releases_listener_exactly_once() {
        let conn = MemoryConnection::new();
        let mut listener = conn.subscribe("children/c1/milestoneProgress", Query::new());
        assert_eq!(conn.active_listeners(), 1);

        // Closed before the first emission
        listener.close();
        listener.close();
        assert_eq!(conn.active_listeners(), 0);
        assert!(listener.is_closed());
        assert!(listener.next_snapshot().await.is_none());

        drop(listener);
        assert_eq!(conn.active_listeners(), 0);
    }

    #[tokio::test]
    async fn test_dropping_listener_releases_it() {
        let conn = MemoryConnection::new();
        {
            let _first = conn.subscribe("behaviors", Query::new());
            let _second = conn.subscribe("behaviors", Query::new());
            assert_eq!(conn.active_listeners(), 2);
        }
        assert_eq!(conn.active_listeners(), 0);
    }

    #[tokio::test]
    async fn test_error_ends_the_listener() {
        let conn = MemoryConnection::new();
        let mut listener = conn.subscribe("behaviors", Query::new());
        conn.set_offline(true);

        assert!(listener.next_snapshot().await.unwrap().is_err());
        assert!(listener.is_closed());
        assert_eq!(conn.active_listeners(), 0);
        assert!(listener.next_snapshot().await.is_none());
    }
}
