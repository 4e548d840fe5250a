//! Shared fixtures for service and repository tests.
//!
//! [`TestEnvironment`] wires an in-memory store, the default collection
//! names, a pinned clock and a signed-in parent, and builds services on top.

use chrono::{NaiveDate, TimeZone, Utc};
use shared::ChildProfile;
use std::sync::Arc;

use super::memory::MemoryConnection;
use super::repositories::{
    BehaviorRepository, ChildRepository, MilestoneProgressRepository, MilestoneTemplateRepository,
};
use super::traits::DocumentStore;
use crate::config::{CollectionNames, StoreSettings};
use crate::domain::clock::{Clock, FixedClock};
use crate::domain::models::{Child, MilestoneTemplate, SessionContext};
use crate::domain::{BehaviorService, ChildService, MilestoneService};

pub const TEST_PARENT_ID: &str = "parent-test";

pub struct TestEnvironment {
    pub connection: MemoryConnection,
    pub store: Arc<dyn DocumentStore>,
    pub collections: CollectionNames,
    /// Pinned at 2024-06-15T10:00:00Z
    pub clock: Arc<FixedClock>,
    pub parent: SessionContext,
}

impl TestEnvironment {
    /// Environment with the default indexes provisioned and enforced
    pub fn new() -> Self {
        Self::with_settings(&StoreSettings::default())
    }

    pub fn with_settings(settings: &StoreSettings) -> Self {
        let collections = CollectionNames::default();
        let connection = MemoryConnection::with_settings(settings, &collections);
        let store: Arc<dyn DocumentStore> = Arc::new(connection.clone());
        let now = Utc
            .with_ymd_and_hms(2024, 6, 15, 10, 0, 0)
            .single()
            .expect("valid test timestamp");

        TestEnvironment {
            connection,
            store,
            collections,
            clock: Arc::new(FixedClock::new(now)),
            parent: SessionContext::new(TEST_PARENT_ID),
        }
    }

    fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn child_repository(&self) -> ChildRepository {
        ChildRepository::new(self.store.clone(), &self.collections)
    }

    pub fn progress_repository(&self) -> MilestoneProgressRepository {
        MilestoneProgressRepository::new(self.store.clone(), &self.collections)
    }

    pub fn template_repository(&self) -> MilestoneTemplateRepository {
        MilestoneTemplateRepository::new(self.store.clone(), &self.collections)
    }

    pub fn child_service(&self) -> ChildService {
        ChildService::new(self.child_repository(), self.clock())
    }

    pub fn milestone_service(&self) -> MilestoneService {
        MilestoneService::new(
            self.child_service(),
            self.template_repository(),
            self.progress_repository(),
            self.clock(),
        )
    }

    pub fn behavior_service(&self) -> BehaviorService {
        BehaviorService::new(
            self.child_service(),
            BehaviorRepository::new(self.store.clone(), &self.collections),
            self.clock(),
        )
    }

    /// Store a child owned by the test parent, bypassing validation
    pub async fn create_test_child(&self, name: &str, birthdate: Option<NaiveDate>) -> Child {
        let child = Child {
            id: Child::generate_id(),
            name: name.to_string(),
            nickname: None,
            birthdate,
            parent_id: TEST_PARENT_ID.to_string(),
            profile: ChildProfile::default(),
            created_at: self.clock.now(),
        };
        self.child_repository()
            .store_child(&child)
            .await
            .expect("store test child");
        child
    }

    pub async fn seed_templates(&self, templates: &[MilestoneTemplate]) {
        self.template_repository()
            .seed_templates(templates)
            .await
            .expect("seed templates");
    }
}

pub fn template(id: &str, age_range: &str, description: &str, min: u32, max: u32) -> MilestoneTemplate {
    MilestoneTemplate {
        id: id.to_string(),
        age_range: age_range.to_string(),
        category: "Motor".to_string(),
        description: description.to_string(),
        min_age_months: min,
        max_age_months: max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_environment_children_belong_to_parent() {
        let env = TestEnvironment::new();
        let child = env.create_test_child("Test Child", NaiveDate::from_ymd_opt(2023, 1, 1)).await;

        let loaded = env.child_service().get_child(&env.parent, &child.id).await.unwrap();
        assert_eq!(loaded.name, "Test Child");
        assert_eq!(loaded.created_at, env.clock.now());
    }
}
