//! # Document Model
//!
//! Store-agnostic representation of documents, queries and writes. Every
//! backend (the in-memory connection today, a hosted document database in
//! production) speaks in these terms, and the repositories translate them into
//! domain models.
//!
//! Collections are addressed by slash-separated paths, so a child's progress
//! records live in `children/{child_id}/milestoneProgress`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use super::error::{StoreError, StoreResult};

/// Field map of a stored document
pub type Fields = serde_json::Map<String, Value>;

/// A document read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Deserialize the document fields into a record type
    pub fn decode<T: DeserializeOwned>(&self, collection: &str) -> StoreResult<T> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            StoreError::InvalidDocument {
                path: format!("{}/{}", collection, self.id),
                reason: e.to_string(),
            }
        })
    }
}

/// Serialize a record type into a field map
pub fn encode_fields<T: Serialize>(record: &T) -> StoreResult<Fields> {
    match serde_json::to_value(record) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(StoreError::InvalidDocument {
            path: String::from("<unsaved>"),
            reason: format!("expected an object, got {}", other),
        }),
        Err(e) => Err(StoreError::InvalidDocument {
            path: String::from("<unsaved>"),
            reason: e.to_string(),
        }),
    }
}

/// Address of a single document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    pub collection: String,
    pub id: String,
}

impl DocumentPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Last segment of a collection path; indexes are declared per collection group
pub fn collection_group(collection: &str) -> &str {
    collection.rsplit('/').next().unwrap_or(collection)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl FilterOp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            FilterOp::Eq => ordering == Ordering::Equal,
            FilterOp::Lt => ordering == Ordering::Less,
            FilterOp::Le => ordering != Ordering::Greater,
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Ge => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Filters plus multi-field ordering for a collection query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    /// Whether a document belongs in the result set.
    ///
    /// Like hosted document stores, a document missing a filtered or ordered
    /// field is never part of the result.
    pub fn matches(&self, fields: &Fields) -> bool {
        let filters_pass = self.filters.iter().all(|filter| {
            fields
                .get(&filter.field)
                .and_then(|value| compare_values(value, &filter.value))
                .map(|ordering| filter.op.accepts(ordering))
                .unwrap_or(false)
        });
        filters_pass
            && self
                .order_by
                .iter()
                .all(|order| fields.get(&order.field).map_or(false, |v| !v.is_null()))
    }

    /// Result ordering; document id breaks ties so results are reproducible
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for order in &self.order_by {
            let ordering = match (a.fields.get(&order.field), b.fields.get(&order.field)) {
                (Some(left), Some(right)) => compare_values(left, right).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            };
            let ordering = match order.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.id.cmp(&b.id)
    }

    /// Fields a composite index must cover for this query, in declaration order
    pub fn index_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        let candidates = self
            .filters
            .iter()
            .map(|f| &f.field)
            .chain(self.order_by.iter().map(|o| &o.field));
        for field in candidates {
            if !fields.contains(field) {
                fields.push(field.clone());
            }
        }
        fields
    }
}

/// Compare two JSON values of the same kind. Mixed kinds are incomparable.
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// A composite index declaration: collection group plus the ordered fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeIndex {
    pub collection_group: String,
    pub fields: Vec<String>,
}

impl CompositeIndex {
    pub fn new(collection_group: &str, fields: &[&str]) -> Self {
        Self {
            collection_group: collection_group.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl fmt::Display for CompositeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.collection_group, self.fields.join(", "))
    }
}

/// One merge-upsert inside an atomic batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchWrite {
    pub path: DocumentPath,
    pub fields: Fields,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> Document {
        match value {
            Value::Object(fields) => Document::new(id, fields),
            _ => panic!("test documents must be objects"),
        }
    }

    #[test]
    fn test_range_filter_and_missing_fields() {
        let query = Query::new().filter("minAgeMonths", FilterOp::Le, 12);

        assert!(query.matches(&doc("a", json!({"minAgeMonths": 12})).fields));
        assert!(query.matches(&doc("b", json!({"minAgeMonths": 0})).fields));
        assert!(!query.matches(&doc("c", json!({"minAgeMonths": 13})).fields));
        assert!(!query.matches(&doc("d", json!({"other": 1})).fields));
        assert!(!query.matches(&doc("e", json!({"minAgeMonths": "12"})).fields));
    }

    #[test]
    fn test_multi_field_ordering_is_deterministic() {
        let query = Query::new()
            .order_by("minAgeMonths", Direction::Asc)
            .order_by("description", Direction::Asc);
        let mut docs = vec![
            doc("3", json!({"minAgeMonths": 12, "description": "Walks"})),
            doc("2", json!({"minAgeMonths": 6, "description": "Sits"})),
            doc("1", json!({"minAgeMonths": 12, "description": "Claps"})),
            doc("0", json!({"minAgeMonths": 12, "description": "Claps"})),
        ];
        docs.sort_by(|a, b| query.compare(a, b));

        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "0", "1", "3"]);
    }

    #[test]
    fn test_index_fields_deduplicate_in_order() {
        let query = Query::new()
            .filter("childId", FilterOp::Eq, "c1")
            .filter("parentId", FilterOp::Eq, "p1")
            .order_by("timestamp", Direction::Asc)
            .order_by("childId", Direction::Asc);
        assert_eq!(query.index_fields(), vec!["childId", "parentId", "timestamp"]);
    }

    #[test]
    fn test_collection_group_uses_last_segment() {
        assert_eq!(collection_group("children/abc/milestoneProgress"), "milestoneProgress");
        assert_eq!(collection_group("behaviors"), "behaviors");
    }
}
