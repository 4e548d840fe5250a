//! # Domain Module
//!
//! Business logic for the milestone tracker, independent of any UI or
//! concrete document store.
//!
//! ## Module Organization
//!
//! - **age**: birthdate to whole months
//! - **milestone_merge**: joins templates with a child's progress
//! - **milestone_grouping**: age-range buckets and status counts
//! - **milestone_service**: live milestone views and status transitions
//! - **child_service**: child profiles and ownership checks
//! - **behavior_service**: behavior logs and trend data
//! - **clock**: injectable time source
//!
//! ## Business Rules
//!
//! - A template is eligible once the child reaches its `min_age_months`; it
//!   stays eligible after the child ages past `max_age_months`.
//! - A milestone without a progress record is Not Started.
//! - `date_achieved` is set exactly when the status is Achieved.
//! - Marking a group achieved is all-or-nothing and stamps one shared time.
//! - Every operation on a child first checks that the session's user owns it.

pub mod age;
pub mod behavior_service;
pub mod child_service;
pub mod clock;
pub mod error;
pub mod milestone_grouping;
pub mod milestone_merge;
pub mod milestone_service;
pub mod models;

pub use behavior_service::BehaviorService;
pub use child_service::ChildService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::TrackerError;
pub use milestone_service::{MilestoneService, MilestoneView, MilestoneViewManager};
