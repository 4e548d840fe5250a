//! # Milestone Merge Engine
//!
//! Joins the eligible templates with a child's progress records. Templates
//! define the universe: every template appears exactly once in the output, in
//! input order, and progress for a milestone that is not in the template list
//! is dropped.

use log::debug;
use std::collections::HashMap;

use super::models::{CombinedMilestone, MilestoneProgress, MilestoneStatus, MilestoneTemplate};

/// Left outer join of templates and progress, keyed by milestone id.
///
/// Runs in O(templates + progress). If the store somehow returns two records
/// for one milestone, the first one wins.
pub fn merge_milestones(
    templates: &[MilestoneTemplate],
    progress: &[MilestoneProgress],
) -> Vec<CombinedMilestone> {
    let mut by_id: HashMap<&str, &MilestoneProgress> = HashMap::with_capacity(progress.len());
    for record in progress {
        by_id.entry(record.milestone_id.as_str()).or_insert(record);
    }

    let combined: Vec<CombinedMilestone> = templates
        .iter()
        .map(|template| match by_id.get(template.id.as_str()) {
            Some(record) => CombinedMilestone {
                template: template.clone(),
                current_status: record.status,
                date_achieved: record.date_achieved,
            },
            None => CombinedMilestone {
                template: template.clone(),
                current_status: MilestoneStatus::NotStarted,
                date_achieved: None,
            },
        })
        .collect();

    let orphaned = by_id.len().saturating_sub(
        templates
            .iter()
            .filter(|t| by_id.contains_key(t.id.as_str()))
            .count(),
    );
    if orphaned > 0 {
        debug!("Ignored {} progress records without an eligible template", orphaned);
    }
    combined
}
