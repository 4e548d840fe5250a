use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::domain::age::format_age;
use crate::domain::models::{
    BulkUpdateOutcome, CombinedMilestone, GroupedMilestone, MilestoneOverview, MilestoneProgress,
    MilestoneTemplate,
};
use shared::{
    MarkGroupAchievedResponse, Milestone, MilestoneGroup, MilestoneOverviewResponse,
    SetMilestoneStatusResponse,
};

/// Mapper between milestone domain models and the milestone page DTOs
pub struct MilestoneMapper;

impl MilestoneMapper {
    pub fn to_dto(domain: CombinedMilestone) -> Milestone {
        Milestone {
            id: domain.template.id,
            age_range: domain.template.age_range,
            category: domain.template.category,
            description: domain.template.description,
            min_age_months: domain.template.min_age_months,
            max_age_months: domain.template.max_age_months,
            current_status: domain.current_status,
            date_achieved: domain.date_achieved.map(|d| d.to_rfc3339()),
        }
    }

    pub fn to_domain(dto: Milestone) -> Result<CombinedMilestone> {
        let date_achieved = match dto.date_achieved {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .with_context(|| format!("Failed to parse date_achieved of milestone {}", dto.id))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        Ok(CombinedMilestone {
            template: MilestoneTemplate {
                id: dto.id,
                age_range: dto.age_range,
                category: dto.category,
                description: dto.description,
                min_age_months: dto.min_age_months,
                max_age_months: dto.max_age_months,
            },
            current_status: dto.current_status,
            date_achieved,
        })
    }

    pub fn to_group_dto(domain: GroupedMilestone) -> MilestoneGroup {
        MilestoneGroup {
            age_range: domain.age_range,
            milestones: domain.milestones.into_iter().map(Self::to_dto).collect(),
            group_stats: domain.group_stats,
        }
    }

    /// Rebuild a group the page sent back, e.g. for "mark all achieved"
    pub fn to_group_domain(dto: MilestoneGroup) -> Result<GroupedMilestone> {
        let milestones = dto
            .milestones
            .into_iter()
            .map(Self::to_domain)
            .collect::<Result<Vec<_>>>()?;
        Ok(GroupedMilestone {
            age_range: dto.age_range,
            milestones,
            group_stats: dto.group_stats,
        })
    }

    pub fn to_overview_dto(domain: MilestoneOverview) -> MilestoneOverviewResponse {
        MilestoneOverviewResponse {
            child_id: domain.child_id,
            child_name: domain.child_name,
            age_display: format_age(domain.age_in_months),
            age_in_months: domain.age_in_months,
            groups: domain.groups.into_iter().map(Self::to_group_dto).collect(),
            totals: domain.totals,
        }
    }

    pub fn to_set_status_response_dto(domain: MilestoneProgress) -> SetMilestoneStatusResponse {
        SetMilestoneStatusResponse {
            success_message: format!("Status set to {}.", domain.status),
            milestone_id: domain.milestone_id,
            status: domain.status,
            date_achieved: domain.date_achieved.map(|d| d.to_rfc3339()),
        }
    }

    pub fn to_mark_group_response_dto(domain: BulkUpdateOutcome, age_range: &str) -> MarkGroupAchievedResponse {
        let success_message = if domain.updated_count == 0 {
            format!("All milestones in {} are already achieved.", age_range)
        } else {
            format!("Marked {} milestones in {} as achieved.", domain.updated_count, age_range)
        };
        MarkGroupAchievedResponse {
            updated_count: domain.updated_count,
            achieved_at: domain.achieved_at.map(|d| d.to_rfc3339()),
            success_message,
        }
    }
}
