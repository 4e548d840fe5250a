use crate::domain::models::{BehaviorLog, BehaviorTrendPoint};
use shared::{BehaviorLogEntry, BehaviorTrendPoint as SharedTrendPoint, LogBehaviorResponse};

/// Mapper from behavior domain models to shared DTOs
pub struct BehaviorMapper;

impl BehaviorMapper {
    pub fn to_dto(domain: BehaviorLog) -> BehaviorLogEntry {
        BehaviorLogEntry {
            id: domain.id,
            child_id: domain.child_id,
            behavior_type: domain.behavior_type,
            mood: domain.mood,
            notes: domain.notes,
            location: domain.location,
            timestamp: domain.timestamp.to_rfc3339(),
        }
    }

    pub fn to_logged_response_dto(domain: BehaviorLog, child_name: &str) -> LogBehaviorResponse {
        LogBehaviorResponse {
            entry: Self::to_dto(domain),
            success_message: format!("Behavior for {} has been successfully logged.", child_name),
        }
    }

    pub fn to_trend_dto(points: Vec<BehaviorTrendPoint>) -> Vec<SharedTrendPoint> {
        points
            .into_iter()
            .map(|point| SharedTrendPoint {
                date: point.date.format("%Y-%m-%d").to_string(),
                label: point.label(),
                counts: point
                    .counts
                    .iter()
                    .map(|(kind, count)| (kind.as_str().to_string(), *count))
                    .collect(),
            })
            .collect()
    }
}
