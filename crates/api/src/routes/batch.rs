//! Route definitions for the `/batches` resource.
//!
//! All endpoints act on behalf of the gateway-verified owner identity.

use axum::routing::get;
use axum::Router;

use crate::handlers::batch;
use crate::state::AppState;

/// Routes mounted at `/batches`.
///
/// ```text
/// GET    /        -> list_batches
/// POST   /        -> create_batch
/// GET    /{id}    -> get_batch
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(batch::list_batches).post(batch::create_batch))
        .route("/{id}", get(batch::get_batch))
}
