use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Progress state of a single milestone for a single child.
///
/// The serialized names match what is persisted in the document store, so the
/// same strings show up in stored progress records and in UI payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MilestoneStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Achieved")]
    Achieved,
}

impl MilestoneStatus {
    /// All statuses in the order they are offered to the user
    pub const ALL: [MilestoneStatus; 3] = [
        MilestoneStatus::NotStarted,
        MilestoneStatus::InProgress,
        MilestoneStatus::Achieved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneStatus::NotStarted => "Not Started",
            MilestoneStatus::InProgress => "In Progress",
            MilestoneStatus::Achieved => "Achieved",
        }
    }
}

impl Default for MilestoneStatus {
    fn default() -> Self {
        MilestoneStatus::NotStarted
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MilestoneStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Not Started" => Ok(MilestoneStatus::NotStarted),
            "In Progress" => Ok(MilestoneStatus::InProgress),
            "Achieved" => Ok(MilestoneStatus::Achieved),
            other => Err(format!("Unknown milestone status: {}", other)),
        }
    }
}

/// Status counts for a set of milestones.
///
/// `achieved + in_progress + not_started == total` holds for every value built
/// through [`GroupStats::record`] and [`GroupStats::absorb`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    pub achieved: u32,
    pub in_progress: u32,
    pub not_started: u32,
    pub total: u32,
}

impl GroupStats {
    /// Count one milestone with the given status
    pub fn record(&mut self, status: MilestoneStatus) {
        match status {
            MilestoneStatus::Achieved => self.achieved += 1,
            MilestoneStatus::InProgress => self.in_progress += 1,
            MilestoneStatus::NotStarted => self.not_started += 1,
        }
        self.total += 1;
    }

    /// Add another set of counts into this one
    pub fn absorb(&mut self, other: &GroupStats) {
        self.achieved += other.achieved;
        self.in_progress += other.in_progress;
        self.not_started += other.not_started;
        self.total += other.total;
    }

    /// True when every counted milestone is achieved (and there is at least one)
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.achieved == self.total
    }

    /// Percentage of achieved milestones, 0.0 for an empty set
    pub fn achieved_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.achieved as f64 / self.total as f64 * 100.0
        }
    }

    /// Status used for the group's summary icon
    pub fn headline_status(&self) -> MilestoneStatus {
        if self.is_complete() {
            MilestoneStatus::Achieved
        } else if self.in_progress > 0 {
            MilestoneStatus::InProgress
        } else {
            MilestoneStatus::NotStarted
        }
    }
}

/// Optional profile attributes captured when a child is added
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChildProfile {
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub personality: Vec<String>,
    #[serde(default)]
    pub preferred_style: String,
    #[serde(default)]
    pub favorite_theme: Vec<String>,
    #[serde(default)]
    pub routine: String,
    #[serde(default)]
    pub energy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub name: String,
    pub nickname: Option<String>,
    /// Calendar date (YYYY-MM-DD), absent when the stored value is unusable
    pub birthdate: Option<String>,
    pub parent_id: String,
    pub profile: ChildProfile,
    /// RFC 3339 timestamp
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChildRequest {
    pub name: String,
    pub nickname: Option<String>,
    pub birth_year: i32,
    pub birth_month: u32,
    pub birth_day: u32,
    #[serde(default)]
    pub profile: ChildProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildResponse {
    pub child: Child,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildListResponse {
    pub children: Vec<Child>,
}

/// A milestone template joined with the child's progress on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub age_range: String,
    pub category: String,
    pub description: String,
    pub min_age_months: u32,
    pub max_age_months: u32,
    pub current_status: MilestoneStatus,
    /// RFC 3339 timestamp, present only for achieved milestones
    pub date_achieved: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneGroup {
    pub age_range: String,
    pub milestones: Vec<Milestone>,
    pub group_stats: GroupStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneOverviewResponse {
    pub child_id: String,
    pub child_name: String,
    pub age_in_months: u32,
    /// Human readable age, e.g. "1 years, 3 months"
    pub age_display: String,
    pub groups: Vec<MilestoneGroup>,
    pub totals: GroupStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetMilestoneStatusRequest {
    pub child_id: String,
    pub milestone_id: String,
    pub status: MilestoneStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetMilestoneStatusResponse {
    pub milestone_id: String,
    pub status: MilestoneStatus,
    pub date_achieved: Option<String>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkGroupAchievedResponse {
    pub updated_count: usize,
    pub achieved_at: Option<String>,
    pub success_message: String,
}

/// Behavior categories offered when logging a behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BehaviorType {
    Tantrum,
    #[serde(rename = "Happy Moment")]
    HappyMoment,
    #[serde(rename = "Mealtime Behavior")]
    MealtimeBehavior,
    #[serde(rename = "Sleep Related")]
    SleepRelated,
    #[serde(rename = "Social Interaction")]
    SocialInteraction,
    #[serde(rename = "Learning Activity")]
    LearningActivity,
    Aggression,
    #[serde(rename = "Anxiety/Fear")]
    AnxietyFear,
    #[serde(rename = "Self-Regulation")]
    SelfRegulation,
    #[serde(rename = "Refused Food")]
    RefusedFood,
    Overstimulated,
    Playful,
    Focused,
    Irritable,
    Other,
}

impl BehaviorType {
    pub const ALL: [BehaviorType; 15] = [
        BehaviorType::Tantrum,
        BehaviorType::HappyMoment,
        BehaviorType::MealtimeBehavior,
        BehaviorType::SleepRelated,
        BehaviorType::SocialInteraction,
        BehaviorType::LearningActivity,
        BehaviorType::Aggression,
        BehaviorType::AnxietyFear,
        BehaviorType::SelfRegulation,
        BehaviorType::RefusedFood,
        BehaviorType::Overstimulated,
        BehaviorType::Playful,
        BehaviorType::Focused,
        BehaviorType::Irritable,
        BehaviorType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorType::Tantrum => "Tantrum",
            BehaviorType::HappyMoment => "Happy Moment",
            BehaviorType::MealtimeBehavior => "Mealtime Behavior",
            BehaviorType::SleepRelated => "Sleep Related",
            BehaviorType::SocialInteraction => "Social Interaction",
            BehaviorType::LearningActivity => "Learning Activity",
            BehaviorType::Aggression => "Aggression",
            BehaviorType::AnxietyFear => "Anxiety/Fear",
            BehaviorType::SelfRegulation => "Self-Regulation",
            BehaviorType::RefusedFood => "Refused Food",
            BehaviorType::Overstimulated => "Overstimulated",
            BehaviorType::Playful => "Playful",
            BehaviorType::Focused => "Focused",
            BehaviorType::Irritable => "Irritable",
            BehaviorType::Other => "Other",
        }
    }

    /// Parse a stored label; anything outside the catalog is bucketed as `Other`
    pub fn from_label(label: &str) -> BehaviorType {
        BehaviorType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == label)
            .unwrap_or(BehaviorType::Other)
    }
}

impl fmt::Display for BehaviorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a logged behavior happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorLocation {
    Home,
    #[serde(rename = "School/Daycare")]
    SchoolDaycare,
    #[serde(rename = "Playground/Park")]
    PlaygroundPark,
    #[serde(rename = "Store/Public Place")]
    StorePublicPlace,
    #[serde(rename = "Relative's Home")]
    RelativesHome,
    Car,
    Other,
}

impl BehaviorLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorLocation::Home => "Home",
            BehaviorLocation::SchoolDaycare => "School/Daycare",
            BehaviorLocation::PlaygroundPark => "Playground/Park",
            BehaviorLocation::StorePublicPlace => "Store/Public Place",
            BehaviorLocation::RelativesHome => "Relative's Home",
            BehaviorLocation::Car => "Car",
            BehaviorLocation::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogBehaviorRequest {
    pub child_id: String,
    pub behavior_type: BehaviorType,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub notes: String,
    pub location: Option<BehaviorLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorLogEntry {
    pub id: String,
    pub child_id: String,
    pub behavior_type: String,
    pub mood: String,
    pub notes: String,
    pub location: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogBehaviorResponse {
    pub entry: BehaviorLogEntry,
    pub success_message: String,
}

/// One bar of the behavior trend chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorTrendPoint {
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
    /// Axis label, e.g. "Mar 4"
    pub label: String,
    /// Count per behavior type label; every catalog type is present
    pub counts: BTreeMap<String, u32>,
}
