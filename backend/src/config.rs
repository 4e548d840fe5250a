//! # Backend Configuration
//!
//! YAML configuration for the milestone tracker backend. Every section has
//! defaults, so an empty file (or no file at all) yields a working setup:
//!
//! ```yaml
//! collections:
//!   children: children
//!   milestone_templates: milestoneTemplates
//!   milestone_progress: milestoneProgress
//!   behaviors: behaviors
//! logging:
//!   filter: info
//! store:
//!   enforce_indexes: true
//!   indexes:
//!     - collection_group: milestoneTemplates
//!       fields: [minAgeMonths, description]
//! template_seed: milestone_templates.yaml
//! ```

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::models::MilestoneTemplate;
use crate::storage::CompositeIndex;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub collections: CollectionNames,
    pub logging: LoggingConfig,
    pub store: StoreSettings,
    /// YAML list of milestone templates loaded into the catalog at startup
    pub template_seed: Option<PathBuf>,
}

impl BackendConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_yaml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        // Seed paths are relative to the config file
        if let (Some(seed), Some(dir)) = (config.template_seed.as_mut(), path.parent()) {
            if seed.is_relative() {
                *seed = dir.join(&*seed);
            }
        }

        info!("Loaded backend config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }
}

/// Names of the collections the tracker reads and writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionNames {
    pub children: String,
    pub milestone_templates: String,
    /// Subcollection under each child document
    pub milestone_progress: String,
    pub behaviors: String,
}

impl CollectionNames {
    /// Full path of one child's progress subcollection
    pub fn progress_collection(&self, child_id: &str) -> String {
        format!("{}/{}/{}", self.children, child_id, self.milestone_progress)
    }
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            children: "children".to_string(),
            milestone_templates: "milestoneTemplates".to_string(),
            milestone_progress: "milestoneProgress".to_string(),
            behaviors: "behaviors".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Reject queries that need a composite index not listed in `indexes`
    pub enforce_indexes: bool,
    /// Provisioned indexes. When unset, the indexes the tracker's own queries
    /// need are provisioned for the configured collection names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexes: Option<Vec<CompositeIndex>>,
}

impl StoreSettings {
    /// The index list to provision against `collections`
    pub fn resolved_indexes(&self, collections: &CollectionNames) -> Vec<CompositeIndex> {
        match &self.indexes {
            Some(indexes) => indexes.clone(),
            None => default_indexes(collections),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            enforce_indexes: true,
            indexes: None,
        }
    }
}

/// Indexes required by the queries the tracker issues
pub fn default_indexes(collections: &CollectionNames) -> Vec<CompositeIndex> {
    vec![
        CompositeIndex::new(&collections.milestone_templates, &["minAgeMonths", "description"]),
        CompositeIndex::new(&collections.children, &["parentId", "createdAt"]),
        CompositeIndex::new(&collections.behaviors, &["childId", "parentId", "timestamp"]),
    ]
}

/// Read a YAML list of milestone templates
pub fn load_template_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<MilestoneTemplate>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read template catalog {}", path.display()))?;
    let templates: Vec<MilestoneTemplate> = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse template catalog {}", path.display()))?;

    for template in &templates {
        if template.id.trim().is_empty() {
            anyhow::bail!("Template catalog {} contains an entry without an id", path.display());
        }
    }

    info!("Loaded {} milestone templates from {}", templates.len(), path.display());
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = BackendConfig::from_yaml_str("").unwrap();
        assert_eq!(config, BackendConfig::default());
        assert!(config.store.enforce_indexes);
        assert_eq!(config.collections.progress_collection("c1"), "children/c1/milestoneProgress");
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = BackendConfig::from_yaml_str(
            "logging:\n  filter: debug\nstore:\n  enforce_indexes: false\n",
        )
        .unwrap();
        assert_eq!(config.logging.filter, "debug");
        assert!(!config.store.enforce_indexes);
        assert_eq!(config.store.indexes, None);
        assert_eq!(
            config.store.resolved_indexes(&config.collections),
            default_indexes(&CollectionNames::default())
        );
        assert_eq!(config.collections.behaviors, "behaviors");
    }

    #[test]
    fn test_renamed_collections_get_matching_default_indexes() {
        let config = BackendConfig::from_yaml_str(
            "collections:\n  milestone_templates: catalog\n  behaviors: behaviorLogs\n",
        )
        .unwrap();
        let groups: Vec<String> = config
            .store
            .resolved_indexes(&config.collections)
            .into_iter()
            .map(|index| index.collection_group)
            .collect();
        assert_eq!(groups, vec!["catalog", "children", "behaviorLogs"]);
    }

    #[test]
    fn test_explicit_indexes_are_kept() {
        let config = BackendConfig::from_yaml_str(
            "collections:\n  milestone_templates: catalog\nstore:\n  indexes: []\n",
        )
        .unwrap();
        assert!(config.store.resolved_indexes(&config.collections).is_empty());
    }

    #[test]
    fn test_load_resolves_seed_relative_to_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("tracker.yaml");
        fs::write(&config_path, "template_seed: catalog.yaml\n").unwrap();

        let config = BackendConfig::load(&config_path).unwrap();
        assert_eq!(config.template_seed, Some(dir.path().join("catalog.yaml")));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = BackendConfig::load(dir.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_template_catalog() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.yaml");
        fs::write(
            &path,
            r#"
- id: walks-alone
  age_range: "12-18 months"
  category: Motor
  description: Walks alone
  min_age_months: 12
  max_age_months: 18
- id: first-words
  age_range: "12-18 months"
  category: Language
  description: Says first words
  min_age_months: 12
  max_age_months: 18
"#,
        )
        .unwrap();

        let templates = load_template_catalog(&path).unwrap();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].id, "walks-alone");
        assert_eq!(templates[1].min_age_months, 12);
    }

    #[test]
    fn test_catalog_entries_need_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.yaml");
        fs::write(
            &path,
            "- id: \"\"\n  age_range: x\n  category: y\n  description: z\n  min_age_months: 0\n  max_age_months: 3\n",
        )
        .unwrap();
        assert!(load_template_catalog(&path).is_err());
    }
}
