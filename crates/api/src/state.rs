use std::sync::Arc;

use easel_core::files::BaseUrlFileService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: easel_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Resolves platform object URLs back to storage keys.
    pub files: Arc<BaseUrlFileService>,
}

impl AppState {
    /// Build state from loaded configuration and an established pool.
    pub fn new(pool: easel_db::DbPool, config: ServerConfig) -> Self {
        let files = Arc::new(BaseUrlFileService::new(
            config.storage_public_base_urls.clone(),
        ));
        Self {
            pool,
            config: Arc::new(config),
            files,
        }
    }
}
