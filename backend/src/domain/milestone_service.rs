//! # Milestone Service
//!
//! Orchestrates the milestone page: age calculation, template eligibility,
//! the live progress subscription, merge, grouping and status transitions.
//!
//! ## Key Responsibilities
//!
//! - **Views**: [`MilestoneService::open_view`] resolves the child, computes
//!   its age, loads eligible templates and subscribes to progress. Each
//!   snapshot re-runs merge and grouping synchronously.
//! - **Single transitions**: [`MilestoneService::set_status`] merge-upserts
//!   one progress record, setting or clearing the achieved date.
//! - **Bulk transitions**: [`MilestoneService::mark_group_achieved`] writes
//!   every not-yet-achieved milestone of a group in one atomic batch with one
//!   shared timestamp.
//! - **View lifetime**: [`MilestoneViewManager`] keeps at most one view open
//!   and tears the old one down before opening a new one.
//!
//! Status changes do not update an open view directly. The write lands in the
//! store, the store notifies the view's subscription, and the next
//! [`MilestoneView::next_overview`] call reflects it.

use chrono::SubsecRound;
use log::{debug, info, warn};
use std::sync::Arc;

use super::age::age_in_months;
use super::child_service::ChildService;
use super::clock::Clock;
use super::error::TrackerError;
use super::milestone_grouping::group_milestones;
use super::milestone_merge::merge_milestones;
use super::models::{
    BulkUpdateOutcome, GroupedMilestone, MilestoneOverview, MilestoneProgress, MilestoneStatus,
    MilestoneTemplate, SessionContext, StatusUpdate,
};
use crate::storage::{MilestoneProgressRepository, MilestoneTemplateRepository, ProgressSubscription};

#[derive(Clone)]
pub struct MilestoneService {
    child_service: ChildService,
    templates: MilestoneTemplateRepository,
    progress: MilestoneProgressRepository,
    clock: Arc<dyn Clock>,
}

impl MilestoneService {
    pub fn new(
        child_service: ChildService,
        templates: MilestoneTemplateRepository,
        progress: MilestoneProgressRepository,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            child_service,
            templates,
            progress,
            clock,
        }
    }

    /// Open the live milestone view for one child
    pub async fn open_view(
        &self,
        session: &SessionContext,
        child_id: &str,
    ) -> Result<MilestoneView, TrackerError> {
        let child = self.child_service.get_child(session, child_id).await?;
        let age = age_in_months(child.birthdate, self.clock.today());
        let templates = self.templates.fetch_eligible(age).await?;
        info!(
            "Opening milestone view for child {} (age {} months, {} templates)",
            child.id,
            age,
            templates.len()
        );

        Ok(MilestoneView {
            child_id: child.id.clone(),
            child_name: child.name,
            user_id: session.user_id().to_string(),
            age_in_months: age,
            templates,
            subscription: self.progress.observe(&child.id),
            latest: None,
        })
    }

    /// Set one milestone's status and return the stored record.
    ///
    /// Achieved stamps `date_achieved` with the current time, every other
    /// status clears it. Notes on the record are left as they were.
    pub async fn set_status(
        &self,
        session: &SessionContext,
        child_id: &str,
        milestone_id: &str,
        status: MilestoneStatus,
    ) -> Result<MilestoneProgress, TrackerError> {
        let child = self.child_service.get_child(session, child_id).await?;
        let update = StatusUpdate::new(milestone_id, status, self.clock.now());
        self.progress.upsert_status(&child.id, &update).await?;

        let stored = self.progress.get_progress(&child.id, milestone_id).await?;
        stored.ok_or_else(|| {
            TrackerError::NotFound(format!("Progress for milestone {} was not saved.", milestone_id))
        })
    }

    /// Mark every milestone in `group` achieved that isn't already.
    ///
    /// Uses the group's current statuses to pick candidates. Nothing is
    /// written when every milestone is already achieved. A failed batch
    /// leaves every record as it was.
    pub async fn mark_group_achieved(
        &self,
        session: &SessionContext,
        child_id: &str,
        group: &GroupedMilestone,
    ) -> Result<BulkUpdateOutcome, TrackerError> {
        let child = self.child_service.get_child(session, child_id).await?;

        let candidates: Vec<&str> = group
            .milestones
            .iter()
            .filter(|m| m.current_status != MilestoneStatus::Achieved)
            .map(|m| m.id())
            .collect();
        if candidates.is_empty() {
            info!("All milestones in '{}' already achieved; nothing to write", group.age_range);
            return Ok(BulkUpdateOutcome::nothing_to_update());
        }

        let achieved_at = self.clock.now().trunc_subsecs(StatusUpdate::TIMESTAMP_PRECISION);
        let updates: Vec<StatusUpdate> = candidates
            .iter()
            .map(|id| StatusUpdate::new(id, MilestoneStatus::Achieved, achieved_at))
            .collect();

        if let Err(e) = self.progress.upsert_statuses(&child.id, &updates).await {
            warn!("Bulk update of '{}' for child {} failed: {}", group.age_range, child.id, e);
            return Err(e.into());
        }

        info!(
            "Marked {} milestones achieved in '{}' for child {}",
            updates.len(),
            group.age_range,
            child.id
        );
        Ok(BulkUpdateOutcome {
            updated_count: updates.len(),
            updated_milestone_ids: candidates.into_iter().map(str::to_string).collect(),
            achieved_at: Some(achieved_at),
        })
    }

    /// Attach free-text notes to a milestone without changing its status
    pub async fn update_notes(
        &self,
        session: &SessionContext,
        child_id: &str,
        milestone_id: &str,
        notes: Option<&str>,
    ) -> Result<(), TrackerError> {
        let child = self.child_service.get_child(session, child_id).await?;
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());
        self.progress.update_notes(&child.id, milestone_id, notes).await?;
        Ok(())
    }
}

/// A child's milestone page kept current by the progress subscription.
///
/// Templates are fetched once when the view opens; progress is re-read on
/// every change.
pub struct MilestoneView {
    child_id: String,
    child_name: String,
    user_id: String,
    age_in_months: u32,
    templates: Vec<MilestoneTemplate>,
    subscription: ProgressSubscription,
    latest: Option<MilestoneOverview>,
}

impl MilestoneView {
    /// Wait for the next progress snapshot and rebuild the overview.
    ///
    /// The first call returns immediately with the current state. Returns
    /// `None` once the view is closed; a store error closes it.
    pub async fn next_overview(&mut self) -> Option<Result<MilestoneOverview, TrackerError>> {
        let progress = match self.subscription.next().await? {
            Ok(progress) => progress,
            Err(e) => {
                warn!("Progress subscription for child {} failed: {}", self.child_id, e);
                return Some(Err(e.into()));
            }
        };

        let grouping = group_milestones(merge_milestones(&self.templates, &progress));
        debug!(
            "Rebuilt overview for child {}: {} groups, {}/{} achieved",
            self.child_id,
            grouping.groups.len(),
            grouping.totals.achieved,
            grouping.totals.total
        );

        let overview = MilestoneOverview {
            child_id: self.child_id.clone(),
            child_name: self.child_name.clone(),
            age_in_months: self.age_in_months,
            groups: grouping.groups,
            totals: grouping.totals,
        };
        self.latest = Some(overview.clone());
        Some(Ok(overview))
    }

    /// The most recent overview, if one has been built
    pub fn latest(&self) -> Option<&MilestoneOverview> {
        self.latest.as_ref()
    }

    pub fn child_id(&self) -> &str {
        &self.child_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn age_in_months(&self) -> u32 {
        self.age_in_months
    }

    pub fn close(&mut self) {
        self.subscription.close();
    }

    pub fn is_closed(&self) -> bool {
        self.subscription.is_closed()
    }
}

/// Holds the one open milestone view, keyed by (user, child)
pub struct MilestoneViewManager {
    service: MilestoneService,
    active: Option<MilestoneView>,
}

impl MilestoneViewManager {
    pub fn new(service: MilestoneService) -> Self {
        Self {
            service,
            active: None,
        }
    }

    /// Show `child_id` for the session's user.
    ///
    /// Reuses the open view when the user and child are unchanged. Otherwise
    /// the previous view is closed before the new one is opened, so two
    /// subscriptions never coexist.
    pub async fn switch_to(
        &mut self,
        session: &SessionContext,
        child_id: &str,
    ) -> Result<&mut MilestoneView, TrackerError> {
        let reusable = self.active.as_ref().map_or(false, |view| {
            !view.is_closed() && view.child_id() == child_id && view.user_id() == session.user_id()
        });

        if !reusable {
            self.close();
            let view = self.service.open_view(session, child_id).await?;
            self.active = Some(view);
        }

        self.active
            .as_mut()
            .ok_or_else(|| TrackerError::NotFound("No milestone view is open.".to_string()))
    }

    pub fn active_view(&mut self) -> Option<&mut MilestoneView> {
        self.active.as_mut()
    }

    /// Tear down the open view, if any
    pub fn close(&mut self) {
        if let Some(mut view) = self.active.take() {
            debug!("Closing milestone view for child {}", view.child_id());
            view.close();
        }
    }
}
