//! Application state shared across handlers.

use arca_core::Config;
use arca_services::AssetService;
use arca_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Kept for health checks; data access goes through the service.
    pub pool: Option<PgPool>,
    pub storage: Arc<dyn Storage>,
    pub service: AssetService,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: Option<PgPool>,
        storage: Arc<dyn Storage>,
        service: AssetService,
    ) -> Self {
        Self {
            config,
            pool,
            storage,
            service,
        }
    }
}
