//! Milestone domain models: catalog templates, per-child progress, and the
//! derived views built from them.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

pub use shared::{GroupStats, MilestoneStatus};

/// A catalog entry describing one developmental checkpoint.
/// Read-only from the tracker's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneTemplate {
    pub id: String,
    /// Display label of the age bucket, e.g. "12-18 months"
    pub age_range: String,
    pub category: String,
    pub description: String,
    /// Inclusive lower bound of the typical window
    pub min_age_months: u32,
    /// Inclusive upper bound; not used for eligibility
    pub max_age_months: u32,
}

impl MilestoneTemplate {
    /// Bucket label, falling back to the numeric window when the label is blank
    pub fn group_label(&self) -> String {
        if self.age_range.trim().is_empty() {
            format!("Age {}-{} months", self.min_age_months, self.max_age_months)
        } else {
            self.age_range.clone()
        }
    }
}

/// A child's progress on one milestone.
///
/// The record is stored under the template's id, so `milestone_id` is both
/// the foreign key and the record's own key. That keying is what limits a
/// child to one progress record per milestone; there is no separate
/// uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneProgress {
    pub milestone_id: String,
    pub status: MilestoneStatus,
    /// Set exactly when `status` is `Achieved`
    pub date_achieved: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// The fields written by a status transition. Notes are absent
/// so a merge-upsert leaves them alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub milestone_id: String,
    pub status: MilestoneStatus,
    pub date_achieved: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    /// Timestamps are kept to the millisecond, the precision the store keeps
    pub const TIMESTAMP_PRECISION: u16 = 3;

    pub fn new(milestone_id: &str, status: MilestoneStatus, now: DateTime<Utc>) -> Self {
        Self {
            milestone_id: milestone_id.to_string(),
            status,
            date_achieved: (status == MilestoneStatus::Achieved)
                .then(|| now.trunc_subsecs(Self::TIMESTAMP_PRECISION)),
        }
    }
}

/// A template joined with the child's progress (or the defaults when none exists)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedMilestone {
    pub template: MilestoneTemplate,
    pub current_status: MilestoneStatus,
    pub date_achieved: Option<DateTime<Utc>>,
}

impl CombinedMilestone {
    pub fn id(&self) -> &str {
        &self.template.id
    }
}

/// Milestones sharing one age-range label, with their status counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedMilestone {
    pub age_range: String,
    pub milestones: Vec<CombinedMilestone>,
    pub group_stats: GroupStats,
}

/// Output of the grouping engine: ordered groups plus totals across all of them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilestoneGrouping {
    pub groups: Vec<GroupedMilestone>,
    pub totals: GroupStats,
}

/// Everything the milestone page renders for one child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneOverview {
    pub child_id: String,
    pub child_name: String,
    pub age_in_months: u32,
    pub groups: Vec<GroupedMilestone>,
    pub totals: GroupStats,
}

impl MilestoneOverview {
    pub fn group(&self, age_range: &str) -> Option<&GroupedMilestone> {
        self.groups.iter().find(|g| g.age_range == age_range)
    }
}

/// Result of marking a whole group achieved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkUpdateOutcome {
    pub updated_count: usize,
    pub updated_milestone_ids: Vec<String>,
    /// Shared timestamp of the batch; `None` when nothing was written
    pub achieved_at: Option<DateTime<Utc>>,
}

impl BulkUpdateOutcome {
    pub fn nothing_to_update() -> Self {
        Self {
            updated_count: 0,
            updated_milestone_ids: Vec::new(),
            achieved_at: None,
        }
    }
}
