use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::ChildProfile;
use uuid::Uuid;

/// Domain model representing a child profile owned by one parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub name: String,
    pub nickname: Option<String>,
    /// `None` when the stored birthdate is missing or not a calendar date
    pub birthdate: Option<NaiveDate>,
    pub parent_id: String,
    pub profile: ChildProfile,
    pub created_at: DateTime<Utc>,
}

impl Child {
    /// Generate a unique ID for a child
    pub fn generate_id() -> String {
        format!("child::{}", Uuid::new_v4())
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.parent_id == user_id
    }
}
