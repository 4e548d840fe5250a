use chrono::NaiveDate;
use log::{debug, info, warn};
use std::sync::Arc;

use super::clock::Clock;
use super::error::TrackerError;
use super::models::{Child, SessionContext};
use crate::storage::{ChildRepository, ChildSubscription};
use shared::CreateChildRequest;

const MAX_NAME_LENGTH: usize = 100;

/// Service for creating and looking up child profiles.
///
/// Every lookup is owner-checked against the caller's session; other
/// services go through [`ChildService::get_child`] before touching anything
/// that hangs off a child.
#[derive(Clone)]
pub struct ChildService {
    children: ChildRepository,
    clock: Arc<dyn Clock>,
}

impl ChildService {
    pub fn new(children: ChildRepository, clock: Arc<dyn Clock>) -> Self {
        Self { children, clock }
    }

    /// Create a child profile owned by the session's user
    pub async fn create_child(
        &self,
        session: &SessionContext,
        request: CreateChildRequest,
    ) -> Result<Child, TrackerError> {
        info!(
            "Creating child: name={}, birthdate={}-{:02}-{:02}",
            request.name, request.birth_year, request.birth_month, request.birth_day
        );

        let birthdate = self.validate_create_request(&request)?;
        let nickname = request
            .nickname
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let child = Child {
            id: Child::generate_id(),
            name: request.name.trim().to_string(),
            nickname,
            birthdate: Some(birthdate),
            parent_id: session.user_id().to_string(),
            profile: request.profile,
            created_at: self.clock.now(),
        };

        self.children.store_child(&child).await?;
        info!("Created child: {} with ID: {}", child.name, child.id);
        Ok(child)
    }

    /// Load a child the session's user owns.
    ///
    /// Someone else's child yields `Unauthorized` with a generic message.
    pub async fn get_child(
        &self,
        session: &SessionContext,
        child_id: &str,
    ) -> Result<Child, TrackerError> {
        let child = self
            .children
            .get_child(child_id)
            .await?
            .ok_or_else(|| {
                warn!("Child not found: {}", child_id);
                TrackerError::NotFound("Child profile not found.".to_string())
            })?;

        if !child.is_owned_by(session.user_id()) {
            warn!("User {} denied access to child {}", session.user_id(), child_id);
            return Err(TrackerError::Unauthorized);
        }
        Ok(child)
    }

    /// The session user's children, newest first
    pub async fn list_children(&self, session: &SessionContext) -> Result<Vec<Child>, TrackerError> {
        let children = self.children.list_children_for_parent(session.user_id()).await?;
        info!("Found {} children for user {}", children.len(), session.user_id());
        Ok(children)
    }

    /// Live list of the session user's children, newest first
    pub fn observe_children(&self, session: &SessionContext) -> ChildSubscription {
        debug!("Observing children of user {}", session.user_id());
        self.children.observe_for_parent(session.user_id())
    }

    fn validate_create_request(&self, request: &CreateChildRequest) -> Result<NaiveDate, TrackerError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(TrackerError::validation("Child's name is required."));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(TrackerError::validation(format!(
                "Child's name cannot exceed {} characters.",
                MAX_NAME_LENGTH
            )));
        }

        let birthdate = NaiveDate::from_ymd_opt(request.birth_year, request.birth_month, request.birth_day)
            .ok_or_else(|| TrackerError::validation("The selected date is not valid."))?;
        if birthdate > self.clock.today() {
            return Err(TrackerError::validation("Birthdate cannot be in the future."));
        }
        Ok(birthdate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::TestEnvironment;
    use shared::ChildProfile;

    fn request(name: &str, year: i32, month: u32, day: u32) -> CreateChildRequest {
        CreateChildRequest {
            name: name.to_string(),
            nickname: Some("  ".to_string()),
            birth_year: year,
            birth_month: month,
            birth_day: day,
            profile: ChildProfile {
                challenges: vec!["Transitions".to_string()],
                ..ChildProfile::default()
            },
        }
    }

    #[tokio::test]
    async fn test_create_and_get_child() {
        let env = TestEnvironment::new();
        let service = env.child_service();

        let child = service
            .create_child(&env.parent, request("  Maya ", 2023, 2, 14))
            .await
            .unwrap();
        assert!(child.id.starts_with("child::"));
        assert_eq!(child.name, "Maya");
        assert_eq!(child.nickname, None);
        assert_eq!(child.parent_id, env.parent.user_id());
        assert_eq!(child.created_at, env.clock.now());

        let loaded = service.get_child(&env.parent, &child.id).await.unwrap();
        assert_eq!(loaded, child);
    }

    #[tokio::test]
    async fn test_rejects_invalid_requests() {
        let env = TestEnvironment::new();
        let service = env.child_service();

        let cases = vec![
            request("   ", 2023, 1, 1),
            request(&"x".repeat(101), 2023, 1, 1),
            request("Maya", 2023, 2, 30),
            request("Maya", 2024, 6, 16),
        ];
        for case in cases {
            let err = service.create_child(&env.parent, case).await.unwrap_err();
            assert!(matches!(err, TrackerError::Validation(_)), "unexpected {:?}", err);
        }

        // Born today is allowed
        assert!(service.create_child(&env.parent, request("Maya", 2024, 6, 15)).await.is_ok());
    }

    #[tokio::test]
    async fn test_other_parents_child_is_unauthorized() {
        let env = TestEnvironment::new();
        let service = env.child_service();
        let child = env.create_test_child("Maya", NaiveDate::from_ymd_opt(2023, 6, 15)).await;

        let stranger = SessionContext::new("someone-else");
        assert_eq!(
            service.get_child(&stranger, &child.id).await.unwrap_err(),
            TrackerError::Unauthorized
        );
        assert!(matches!(
            service.get_child(&env.parent, "child::missing").await.unwrap_err(),
            TrackerError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_list_children_newest_first() {
        let env = TestEnvironment::new();
        let service = env.child_service();

        let first = service
            .create_child(&env.parent, request("First", 2021, 1, 1))
            .await
            .unwrap();
        env.clock.advance(chrono::Duration::minutes(5));
        let second = service
            .create_child(&env.parent, request("Second", 2022, 1, 1))
            .await
            .unwrap();
        service
            .create_child(&SessionContext::new("other-parent"), request("Other", 2022, 1, 1))
            .await
            .unwrap();

        let ids: Vec<String> = service
            .list_children(&env.parent)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_observe_children_reflects_new_profiles() {
        let env = TestEnvironment::new();
        let service = env.child_service();

        let mut children = service.observe_children(&env.parent);
        assert!(children.next().await.unwrap().unwrap().is_empty());

        let created = service
            .create_child(&env.parent, request("Maya", 2023, 2, 14))
            .await
            .unwrap();
        service
            .create_child(&SessionContext::new("other-parent"), request("Other", 2022, 1, 1))
            .await
            .unwrap();

        let snapshot = tokio::time::timeout(std::time::Duration::from_secs(1), children.next())
            .await
            .expect("snapshot after create")
            .unwrap()
            .unwrap();
        assert_eq!(snapshot, vec![created]);

        children.close();
        assert!(children.next().await.is_none());
        assert_eq!(env.connection.active_listeners(), 0);
    }
}
