pub mod batch;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /batches            GET list, POST create
/// /batches/{id}       GET detail
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/batches", batch::router())
}
