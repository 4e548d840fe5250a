//! Domain models for the milestone tracker.

pub mod behavior;
pub mod child;
pub mod milestone;
pub mod session;

pub use behavior::{BehaviorLog, BehaviorTrendPoint};
pub use child::Child;
pub use milestone::{
    BulkUpdateOutcome, CombinedMilestone, GroupStats, GroupedMilestone, MilestoneGrouping,
    MilestoneOverview, MilestoneProgress, MilestoneStatus, MilestoneTemplate, StatusUpdate,
};
pub use session::SessionContext;
