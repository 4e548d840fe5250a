use log::info;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::child_service::ChildService;
use super::clock::Clock;
use super::error::TrackerError;
use super::models::{BehaviorLog, BehaviorTrendPoint, SessionContext};
use crate::storage::{BehaviorRepository, BehaviorSubscription};
use shared::{BehaviorLocation, LogBehaviorRequest};

const MAX_MOOD_LENGTH: usize = 50;
const MAX_NOTES_LENGTH: usize = 500;

/// Service for recording behavior logs and preparing the trend chart data
#[derive(Clone)]
pub struct BehaviorService {
    child_service: ChildService,
    behaviors: BehaviorRepository,
    clock: Arc<dyn Clock>,
}

impl BehaviorService {
    pub fn new(child_service: ChildService, behaviors: BehaviorRepository, clock: Arc<dyn Clock>) -> Self {
        Self {
            child_service,
            behaviors,
            clock,
        }
    }

    /// Record a behavior for a child the session's user owns
    pub async fn log_behavior(
        &self,
        session: &SessionContext,
        request: LogBehaviorRequest,
    ) -> Result<BehaviorLog, TrackerError> {
        let child = self.child_service.get_child(session, &request.child_id).await?;

        let mood = request.mood.trim().to_string();
        let notes = request.notes.trim().to_string();
        if mood.chars().count() > MAX_MOOD_LENGTH {
            return Err(TrackerError::validation(format!(
                "Mood/emoji should be {} characters or less.",
                MAX_MOOD_LENGTH
            )));
        }
        if notes.chars().count() > MAX_NOTES_LENGTH {
            return Err(TrackerError::validation(format!(
                "Notes should be {} characters or less.",
                MAX_NOTES_LENGTH
            )));
        }

        let log = BehaviorLog {
            id: String::new(),
            child_id: child.id,
            parent_id: session.user_id().to_string(),
            behavior_type: request.behavior_type.as_str().to_string(),
            mood,
            notes,
            location: request
                .location
                .map(|l| l.as_str())
                .unwrap_or(BehaviorLocation::Home.as_str())
                .to_string(),
            timestamp: self.clock.now(),
        };
        Ok(self.behaviors.store_behavior(log).await?)
    }

    /// Live list of a child's behavior logs, oldest first
    pub async fn observe_behaviors(
        &self,
        session: &SessionContext,
        child_id: &str,
    ) -> Result<BehaviorSubscription, TrackerError> {
        let child = self.child_service.get_child(session, child_id).await?;
        Ok(self.behaviors.observe(&child.id, session.user_id()))
    }

    pub async fn list_behaviors(
        &self,
        session: &SessionContext,
        child_id: &str,
    ) -> Result<Vec<BehaviorLog>, TrackerError> {
        let child = self.child_service.get_child(session, child_id).await?;
        let logs = self.behaviors.list_behaviors(&child.id, session.user_id()).await?;
        info!("Found {} behavior logs for child {}", logs.len(), child.id);
        Ok(logs)
    }

    /// Daily counts per behavior type, one point per day that has logs.
    ///
    /// Days are calendar days in UTC, in ascending order. Types outside the
    /// catalog are counted as `Other`.
    pub fn behavior_trend(logs: &[BehaviorLog]) -> Vec<BehaviorTrendPoint> {
        let mut days: BTreeMap<_, BehaviorTrendPoint> = BTreeMap::new();
        for log in logs {
            let date = log.timestamp.date_naive();
            let point = days
                .entry(date)
                .or_insert_with(|| BehaviorTrendPoint::empty(date));
            *point.counts.entry(log.kind()).or_insert(0) += 1;
        }
        days.into_values().collect()
    }
}
