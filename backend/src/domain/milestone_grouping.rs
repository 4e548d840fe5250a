//! # Grouping & Aggregation Engine
//!
//! Buckets combined milestones by their age-range label and counts statuses
//! per bucket and overall.
//!
//! ## Ordering
//!
//! - Within a group: description, case-sensitive byte order, then id.
//! - Groups: `min_age_months` of the group's first milestone. A group with no
//!   milestones falls back to the leading number of its label (labels such as
//!   "12-18 months" from older data). Groups with no usable key sort last.
//!   Ties break on the label.
//!
//! The output depends only on the input set, never on the order the store
//! returned it in.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::models::{CombinedMilestone, GroupStats, GroupedMilestone, MilestoneGrouping};

pub fn group_milestones(combined: Vec<CombinedMilestone>) -> MilestoneGrouping {
    let mut buckets: HashMap<String, Vec<CombinedMilestone>> = HashMap::new();
    for milestone in combined {
        buckets
            .entry(milestone.template.group_label())
            .or_default()
            .push(milestone);
    }

    let mut groups: Vec<GroupedMilestone> = buckets
        .into_iter()
        .map(|(age_range, mut milestones)| {
            milestones.sort_by(|a, b| {
                a.template
                    .description
                    .cmp(&b.template.description)
                    .then_with(|| a.template.id.cmp(&b.template.id))
            });
            let mut group_stats = GroupStats::default();
            for milestone in &milestones {
                group_stats.record(milestone.current_status);
            }
            GroupedMilestone {
                age_range,
                milestones,
                group_stats,
            }
        })
        .collect();
    sort_groups(&mut groups);

    let mut totals = GroupStats::default();
    for group in &groups {
        totals.absorb(&group.group_stats);
    }

    MilestoneGrouping { groups, totals }
}

/// Sort key of a group; `None` sorts after every number
fn group_sort_key(group: &GroupedMilestone) -> Option<u32> {
    match group.milestones.first() {
        Some(first) => Some(first.template.min_age_months),
        None => parse_age_range_floor(&group.age_range),
    }
}

pub fn sort_groups(groups: &mut [GroupedMilestone]) {
    groups.sort_by(|a, b| {
        let ordering = match (group_sort_key(a), group_sort_key(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        ordering.then_with(|| a.age_range.cmp(&b.age_range))
    });
}

/// Leading number of a label like "12-18 months"
pub fn parse_age_range_floor(label: &str) -> Option<u32> {
    let digits: String = label
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::MilestoneStatus;
    use crate::storage::test_utils::template;

    fn combined(
        id: &str,
        age_range: &str,
        description: &str,
        min: u32,
        status: MilestoneStatus,
    ) -> CombinedMilestone {
        CombinedMilestone {
            template: template(id, age_range, description, min, min + 6),
            current_status: status,
            date_achieved: None,
        }
    }

    #[test]
    fn test_shared_range_forms_one_group() {
        let grouping = group_milestones(vec![
            combined("walks", "12-18 months", "Walks alone", 12, MilestoneStatus::Achieved),
            combined("claps", "12-18 months", "Claps hands", 12, MilestoneStatus::NotStarted),
        ]);

        assert_eq!(grouping.groups.len(), 1);
        let group = &grouping.groups[0];
        assert_eq!(group.age_range, "12-18 months");
        assert_eq!(
            group.group_stats,
            GroupStats {
                achieved: 1,
                in_progress: 0,
                not_started: 1,
                total: 2
            }
        );
        let order: Vec<&str> = group.milestones.iter().map(|m| m.id()).collect();
        assert_eq!(order, vec!["claps", "walks"]);
    }

    #[test]
    fn test_groups_ordered_by_min_age_not_label() {
        let grouping = group_milestones(vec![
            combined("a", "Toddler", "Kicks ball", 24, MilestoneStatus::NotStarted),
            combined("b", "6-9 months", "Sits", 6, MilestoneStatus::Achieved),
            combined("c", "12-18 months", "Walks", 12, MilestoneStatus::InProgress),
            combined("d", "", "Smiles", 2, MilestoneStatus::Achieved),
        ]);

        let labels: Vec<&str> = grouping.groups.iter().map(|g| g.age_range.as_str()).collect();
        assert_eq!(labels, vec!["Age 2-8 months", "6-9 months", "12-18 months", "Toddler"]);
    }

    #[test]
    fn test_description_order_is_case_sensitive() {
        let grouping = group_milestones(vec![
            combined("1", "0-3 months", "smiles", 0, MilestoneStatus::NotStarted),
            combined("2", "0-3 months", "Turns head", 0, MilestoneStatus::NotStarted),
            combined("3", "0-3 months", "Coos", 0, MilestoneStatus::NotStarted),
        ]);
        let order: Vec<&str> = grouping.groups[0]
            .milestones
            .iter()
            .map(|m| m.template.description.as_str())
            .collect();
        assert_eq!(order, vec!["Coos", "Turns head", "smiles"]);
    }

    #[test]
    fn test_output_ignores_input_order() {
        let input = vec![
            combined("x", "12-18 months", "Walks", 12, MilestoneStatus::Achieved),
            combined("y", "6-9 months", "Sits", 6, MilestoneStatus::InProgress),
            combined("z", "12-18 months", "Claps", 12, MilestoneStatus::NotStarted),
            combined("w", "6-9 months", "Babbles", 6, MilestoneStatus::NotStarted),
        ];
        let mut reversed = input.clone();
        reversed.reverse();

        assert_eq!(group_milestones(input), group_milestones(reversed));
    }

    #[test]
    fn test_stats_sum_to_input_size() {
        let statuses = MilestoneStatus::ALL;
        let input: Vec<CombinedMilestone> = (0..23u32)
            .map(|i| {
                combined(
                    &format!("m{}", i),
                    &format!("{}-{} months", (i % 4) * 6, (i % 4) * 6 + 6),
                    &format!("Milestone {}", i),
                    (i % 4) * 6,
                    statuses[(i % 3) as usize],
                )
            })
            .collect();

        let grouping = group_milestones(input);
        let summed: u32 = grouping
            .groups
            .iter()
            .map(|g| g.group_stats.achieved + g.group_stats.in_progress + g.group_stats.not_started)
            .sum();
        assert_eq!(summed, 23);
        assert_eq!(grouping.totals.total, 23);
        for group in &grouping.groups {
            assert_eq!(group.group_stats.total as usize, group.milestones.len());
        }
    }

    #[test]
    fn test_empty_groups_fall_back_to_label() {
        let empty = |label: &str| GroupedMilestone {
            age_range: label.to_string(),
            milestones: Vec::new(),
            group_stats: GroupStats::default(),
        };
        let mut groups = vec![empty("Newborn"), empty("18-24 months"), empty("4-6 months")];
        sort_groups(&mut groups);

        let labels: Vec<&str> = groups.iter().map(|g| g.age_range.as_str()).collect();
        assert_eq!(labels, vec!["4-6 months", "18-24 months", "Newborn"]);
    }

    #[test]
    fn test_parse_age_range_floor() {
        assert_eq!(parse_age_range_floor("12-18 months"), Some(12));
        assert_eq!(parse_age_range_floor(" 0-3 months"), Some(0));
        assert_eq!(parse_age_range_floor("Age 12-18 months"), None);
        assert_eq!(parse_age_range_floor(""), None);
    }
}
