//! # Child Repository
//!
//! Child profiles live in the top-level `children` collection, one document
//! per child, keyed by the child id. The owning parent is stored on the
//! document and is the only field queries filter on.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use shared::ChildProfile;
use std::sync::Arc;

use super::{decode_all, format_timestamp, parse_timestamp, ChildSubscription, RecordSubscription};
use crate::config::CollectionNames;
use crate::domain::age::parse_birthdate;
use crate::domain::models::Child;
use crate::storage::document::{encode_fields, Direction, Document, DocumentPath, FilterOp, Query};
use crate::storage::error::StoreResult;
use crate::storage::traits::DocumentStore;

/// Stored shape of a child document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChildRecord {
    name: String,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    birthdate: Option<String>,
    parent_id: String,
    #[serde(default)]
    profile: ChildProfile,
    created_at: String,
}

impl From<&Child> for ChildRecord {
    fn from(child: &Child) -> Self {
        ChildRecord {
            name: child.name.clone(),
            nickname: child.nickname.clone(),
            birthdate: child.birthdate.map(|d| d.format("%Y-%m-%d").to_string()),
            parent_id: child.parent_id.clone(),
            profile: child.profile.clone(),
            created_at: format_timestamp(&child.created_at),
        }
    }
}

fn decode_child(document: &Document, collection: &str) -> StoreResult<Child> {
    let record: ChildRecord = document.decode(collection)?;
    let created_at = parse_timestamp(&record.created_at, "createdAt", document, collection)?;

    Ok(Child {
        id: document.id.clone(),
        name: record.name,
        nickname: record.nickname.filter(|n| !n.trim().is_empty()),
        // Unusable birthdates are kept as None; age calculation degrades to 0
        birthdate: record.birthdate.as_deref().and_then(parse_birthdate),
        parent_id: record.parent_id,
        profile: record.profile,
        created_at,
    })
}

#[derive(Clone)]
pub struct ChildRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl ChildRepository {
    pub fn new(store: Arc<dyn DocumentStore>, collections: &CollectionNames) -> Self {
        Self {
            store,
            collection: collections.children.clone(),
        }
    }

    pub async fn store_child(&self, child: &Child) -> StoreResult<()> {
        let fields = encode_fields(&ChildRecord::from(child))?;
        self.store
            .set_merge(&DocumentPath::new(&self.collection, &child.id), fields)
            .await?;
        info!("Stored child {} ({})", child.id, child.name);
        Ok(())
    }

    pub async fn get_child(&self, child_id: &str) -> StoreResult<Option<Child>> {
        let path = DocumentPath::new(&self.collection, child_id);
        match self.store.get(&path).await? {
            Some(document) => decode_child(&document, &self.collection).map(Some),
            None => {
                debug!("No child document at {}", path);
                Ok(None)
            }
        }
    }

    fn parent_query(parent_id: &str) -> Query {
        Query::new()
            .filter("parentId", FilterOp::Eq, parent_id)
            .order_by("createdAt", Direction::Desc)
    }

    /// All children of one parent, newest first
    pub async fn list_children_for_parent(&self, parent_id: &str) -> StoreResult<Vec<Child>> {
        let documents = self
            .store
            .query(&self.collection, &Self::parent_query(parent_id))
            .await?;
        Ok(decode_all(&documents, &self.collection, decode_child))
    }

    /// Live version of `list_children_for_parent`
    pub fn observe_for_parent(&self, parent_id: &str) -> ChildSubscription {
        let listener = self
            .store
            .subscribe(&self.collection, Self::parent_query(parent_id));
        RecordSubscription::new(listener, self.collection.clone(), decode_child)
    }
}
