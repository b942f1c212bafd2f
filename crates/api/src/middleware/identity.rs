//! Owner identity extractor for Axum handlers.
//!
//! Authentication lives in the session gateway in front of this
//! service; by the time a request reaches us, the gateway has verified
//! the session and injected the owning user's ID as the `x-user-id`
//! header. Every row this service reads or writes is scoped to that ID.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use easel_core::error::CoreError;
use easel_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// Header set by the session gateway after authenticating the request.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The verified owner a request acts on behalf of.
///
/// Use this as an extractor parameter in any handler that touches
/// owner-scoped data:
///
/// ```ignore
/// async fn my_handler(owner: OwnerIdentity) -> AppResult<Json<()>> {
///     tracing::info!(user_id = owner.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct OwnerIdentity {
    /// The owner's internal database id.
    pub user_id: DbId,
}

impl FromRequestParts<AppState> for OwnerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(format!(
                    "Missing {USER_ID_HEADER} header"
                )))
            })?;

        let user_id: DbId = raw.parse().map_err(|_| {
            AppError::Core(CoreError::Unauthorized(format!(
                "Invalid {USER_ID_HEADER} header"
            )))
        })?;

        Ok(OwnerIdentity { user_id })
    }
}
