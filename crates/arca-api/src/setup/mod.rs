//! Application setup and initialization
//!
//! Initialization logic lives here instead of main.rs so tests can build the
//! same router against in-memory backends.

pub mod routes;
pub mod server;

use anyhow::{Context, Result};
use arca_core::Config;
use arca_db::{AssetStore, PgAssetStore};
use arca_queue::create_channel;
use arca_services::AssetService;
use arca_storage::create_storage;
use std::sync::Arc;

use crate::state::AppState;

/// Wire up the full application: database, storage, channel, service, router.
pub async fn initialize_app(config: Config) -> Result<(AppState, axum::Router)> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let pool = arca_db::setup_pool(&config).await?;
    let store: Arc<dyn AssetStore> = Arc::new(PgAssetStore::new(pool.clone()));

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    let channel = create_channel(&config)
        .await
        .context("Failed to initialize processing channel")?;

    let service = AssetService::new(storage.clone(), store, channel);
    let state = AppState::new(config, Some(pool), storage, service);

    let router = routes::build_router(state.clone());
    Ok((state, router))
}
