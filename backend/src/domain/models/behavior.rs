use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::BehaviorType;
use std::collections::BTreeMap;

/// One logged behavior for a child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorLog {
    /// Assigned by the store when the log is recorded
    pub id: String,
    pub child_id: String,
    pub parent_id: String,
    /// Label as stored; may fall outside the current catalog
    pub behavior_type: String,
    pub mood: String,
    pub notes: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
}

impl BehaviorLog {
    /// Catalog type for charting; unknown labels count as `Other`
    pub fn kind(&self) -> BehaviorType {
        BehaviorType::from_label(&self.behavior_type)
    }
}

/// Behavior counts for one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorTrendPoint {
    pub date: NaiveDate,
    pub counts: BTreeMap<BehaviorType, u32>,
}

impl BehaviorTrendPoint {
    /// A day with every catalog type present at zero
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            counts: BehaviorType::ALL.iter().map(|t| (*t, 0)).collect(),
        }
    }

    pub fn count(&self, behavior_type: BehaviorType) -> u32 {
        self.counts.get(&behavior_type).copied().unwrap_or(0)
    }

    /// Chart axis label, e.g. "Mar 4"
    pub fn label(&self) -> String {
        self.date.format("%b %-d").to_string()
    }
}
