//! # IO Module
//!
//! Translation between domain models and the `shared` DTOs that pages
//! consume. No transport lives here; callers hand the DTOs to whatever UI or
//! wire layer they use.

pub mod mappers;

pub use mappers::{BehaviorMapper, ChildMapper, MilestoneMapper};
