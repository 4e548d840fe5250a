//! # Milestone Template Repository
//!
//! Read access to the milestone catalog (`milestoneTemplates`), plus the
//! seeding path used to load a catalog file into the store.
//!
//! Eligibility is `minAgeMonths <= age` only. The upper bound of a template's
//! window is never applied, so a milestone stays listed after the child has
//! outgrown its typical window.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::decode_all;
use crate::config::CollectionNames;
use crate::domain::models::MilestoneTemplate;
use crate::storage::document::{
    encode_fields, BatchWrite, Direction, Document, DocumentPath, FilterOp, Query,
};
use crate::storage::error::StoreResult;
use crate::storage::traits::DocumentStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateRecord {
    #[serde(default)]
    age_range: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: String,
    min_age_months: u32,
    max_age_months: u32,
}

impl From<&MilestoneTemplate> for TemplateRecord {
    fn from(template: &MilestoneTemplate) -> Self {
        TemplateRecord {
            age_range: template.age_range.clone(),
            category: template.category.clone(),
            description: template.description.clone(),
            min_age_months: template.min_age_months,
            max_age_months: template.max_age_months,
        }
    }
}

fn decode_template(document: &Document, collection: &str) -> StoreResult<MilestoneTemplate> {
    let record: TemplateRecord = document.decode(collection)?;
    Ok(MilestoneTemplate {
        id: document.id.clone(),
        age_range: record.age_range,
        category: record.category,
        description: record.description,
        min_age_months: record.min_age_months,
        max_age_months: record.max_age_months,
    })
}

#[derive(Clone)]
pub struct MilestoneTemplateRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl MilestoneTemplateRepository {
    pub fn new(store: Arc<dyn DocumentStore>, collections: &CollectionNames) -> Self {
        Self {
            store,
            collection: collections.milestone_templates.clone(),
        }
    }

    /// Templates a child of `age_months` is eligible for, ordered by
    /// (minAgeMonths, description).
    ///
    /// Needs the (minAgeMonths, description) composite index; without it the
    /// store fails with `FailedPrecondition` and nothing is returned.
    pub async fn fetch_eligible(&self, age_months: u32) -> StoreResult<Vec<MilestoneTemplate>> {
        let query = Query::new()
            .filter("minAgeMonths", FilterOp::Le, age_months)
            .order_by("minAgeMonths", Direction::Asc)
            .order_by("description", Direction::Asc);

        let documents = self.store.query(&self.collection, &query).await?;
        let templates = decode_all(&documents, &self.collection, decode_template);
        if templates.is_empty() {
            info!("No milestone templates found for age {} months", age_months);
        } else {
            debug!("{} templates eligible at {} months", templates.len(), age_months);
        }
        Ok(templates)
    }

    /// Write catalog entries in one batch. Returns the number written.
    pub async fn seed_templates(&self, templates: &[MilestoneTemplate]) -> StoreResult<usize> {
        let mut writes = Vec::with_capacity(templates.len());
        for template in templates {
            writes.push(BatchWrite {
                path: DocumentPath::new(&self.collection, &template.id),
                fields: encode_fields(&TemplateRecord::from(template))?,
            });
        }
        if writes.is_empty() {
            return Ok(0);
        }

        self.store.batch_write(writes).await?;
        info!("Seeded {} milestone templates", templates.len());
        Ok(templates.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreSettings;
    use crate::storage::error::StoreError;
    use crate::storage::memory::MemoryConnection;
    use crate::storage::test_utils::template;

    fn repository(settings: &StoreSettings) -> MilestoneTemplateRepository {
        let conn = MemoryConnection::with_settings(settings, &CollectionNames::default());
        MilestoneTemplateRepository::new(Arc::new(conn), &CollectionNames::default())
    }

    #[tokio::test]
    async fn test_fetch_eligible_uses_lower_bound_only() {
        let repo = repository(&StoreSettings::default());
        repo.seed_templates(&[
            template("rolls", "4-6 months", "Rolls over", 4, 6),
            template("walks", "12-18 months", "Walks alone", 12, 18),
            template("claps", "12-18 months", "Claps hands", 12, 18),
            template("runs", "18-24 months", "Runs", 13, 24),
        ])
        .await
        .unwrap();

        let eligible = repo.fetch_eligible(12).await.unwrap();
        let ids: Vec<&str> = eligible.iter().map(|t| t.id.as_str()).collect();
        // "rolls" is past its window but stays visible; "runs" starts at 13
        assert_eq!(ids, vec!["rolls", "claps", "walks"]);
    }

    #[tokio::test]
    async fn test_missing_index_returns_no_partial_data() {
        let settings = StoreSettings {
            enforce_indexes: true,
            indexes: Some(Vec::new()),
        };
        let repo = repository(&settings);
        repo.seed_templates(&[template("walks", "12-18 months", "Walks alone", 12, 18)])
            .await
            .unwrap();

        let err = repo.fetch_eligible(24).await.unwrap_err();
        assert!(matches!(err, StoreError::FailedPrecondition { .. }));
    }

    #[tokio::test]
    async fn test_seeding_nothing_writes_nothing() {
        let repo = repository(&StoreSettings::default());
        assert_eq!(repo.seed_templates(&[]).await.unwrap(), 0);
        assert!(repo.fetch_eligible(100).await.unwrap().is_empty());
    }
}
