//! # Milestone Tracker Backend
//!
//! Library consumed by the parent-facing pages: child profiles, behavior logs,
//! and the milestone eligibility and progress engine.
//!
//! ## Layers
//!
//! - **domain**: services and pure engines (age, merge, grouping)
//! - **storage**: the document store seam, in-memory store, repositories
//! - **io**: mappers from domain models to the `shared` DTOs
//! - **config**: YAML configuration
//!
//! Call [`init_logging`] once, then [`initialize_backend`] to get an
//! [`AppState`] holding ready-to-use services.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use config::{load_template_catalog, BackendConfig, LoggingConfig};
use domain::{BehaviorService, ChildService, Clock, MilestoneService, SystemClock};
use storage::{
    BehaviorRepository, ChildRepository, DocumentStore, MemoryConnection,
    MilestoneProgressRepository, MilestoneTemplateRepository,
};

/// Application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub child_service: ChildService,
    pub milestone_service: MilestoneService,
    pub behavior_service: BehaviorService,
    pub connection: MemoryConnection,
}

/// Install the global log subscriber.
///
/// `RUST_LOG` wins over the configured filter. Calling this more than once is
/// harmless; later calls leave the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        log::debug!("Logging already initialized");
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &BackendConfig) -> Result<AppState> {
    initialize_backend_with_clock(config, Arc::new(SystemClock)).await
}

pub async fn initialize_backend_with_clock(
    config: &BackendConfig,
    clock: Arc<dyn Clock>,
) -> Result<AppState> {
    info!("Setting up document store");
    let connection = MemoryConnection::with_settings(&config.store, &config.collections);
    let store: Arc<dyn DocumentStore> = Arc::new(connection.clone());

    let collections = &config.collections;
    let templates = MilestoneTemplateRepository::new(store.clone(), collections);

    if let Some(seed) = &config.template_seed {
        let catalog = load_template_catalog(seed)?;
        templates
            .seed_templates(&catalog)
            .await
            .with_context(|| format!("Failed to seed templates from {}", seed.display()))?;
    }

    info!("Setting up domain services");
    let child_service = ChildService::new(ChildRepository::new(store.clone(), collections), clock.clone());
    let milestone_service = MilestoneService::new(
        child_service.clone(),
        templates,
        MilestoneProgressRepository::new(store.clone(), collections),
        clock.clone(),
    );
    let behavior_service = BehaviorService::new(
        child_service.clone(),
        BehaviorRepository::new(store, collections),
        clock,
    );

    info!("Setting up application state");
    Ok(AppState {
        child_service,
        milestone_service,
        behavior_service,
        connection,
    })
}
