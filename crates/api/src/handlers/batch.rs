//! Handlers for the `/batches` resource.
//!
//! `create_batch` is the orchestration path: sanitize the provider
//! config, allocate seeds, write the batch atomically, then hand the
//! committed generations to the runner. The response reflects the
//! committed rows and is independent of dispatch outcome.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use easel_core::error::CoreError;
use easel_core::types::DbId;
use easel_core::{sanitize, seeds};
use easel_db::models::batch::{Batch, BatchListQuery, NewBatch};
use easel_db::models::generation::Generation;
use easel_db::repositories::{BatchRepo, GenerationRepo};

use crate::engine::DispatchCoordinator;
use crate::error::{AppError, AppResult};
use crate::middleware::identity::OwnerIdentity;
use crate::response::DataResponse;
use crate::state::AppState;

/// Provider config fields known to carry reference-image URLs. Any URL
/// outside these fields is still rejected by the recursive validation
/// pass in `sanitize_config`.
const URL_FIELDS: &[&str] = &["imageUrl", "imageUrls"];

/// Body of `POST /api/v1/batches`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    /// Parent topic/collection the batch belongs to.
    pub topic_id: DbId,
    #[validate(length(min = 1, max = 64))]
    pub provider: String,
    #[validate(length(min = 1, max = 128))]
    pub model: String,
    #[validate(length(min = 1, max = 4000))]
    pub prompt: String,
    #[validate(range(min = 64, max = 4096))]
    pub width: i32,
    #[validate(range(min = 64, max = 4096))]
    pub height: i32,
    /// Number of generations to produce. Upper bound is enforced
    /// against the configured `MAX_BATCH_ITEMS`.
    #[validate(range(min = 1))]
    pub item_count: u16,
    /// Free-form provider parameters; sanitized before persistence.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A batch together with its generations, for read-back endpoints.
#[derive(Debug, Serialize)]
pub struct BatchDetail {
    pub batch: Batch,
    pub generations: Vec<Generation>,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/batches
///
/// Create a batch of `item_count` generations from one prompt/config.
/// Returns 201 with the committed batch and its generation/task pairs
/// as soon as dispatch has been *initiated* — worker completion is
/// reported out-of-band by the runner.
pub async fn create_batch(
    owner: OwnerIdentity,
    State(state): State<AppState>,
    Json(input): Json<CreateBatchRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if input.item_count > state.config.max_batch_items {
        return Err(AppError::BadRequest(format!(
            "itemCount must not exceed {}",
            state.config.max_batch_items
        )));
    }

    // Sanitize before anything is persisted: designated URL fields are
    // converted to storage keys, then the whole config is swept for
    // leftover URLs. A violation aborts with zero rows written.
    let mut config = input.params;
    sanitize::sanitize_config(&mut config, URL_FIELDS, state.files.as_ref())
        .await
        .map_err(AppError::Core)?;

    let seeded = seeds::params_use_seed(&config);
    let allocated = seeds::allocate_seeds(input.item_count as usize, seeded);

    let new_batch = NewBatch {
        topic_id: input.topic_id,
        provider: input.provider,
        model: input.model,
        prompt: input.prompt,
        width: input.width,
        height: input.height,
        config,
    };

    let created =
        BatchRepo::create_with_generations(&state.pool, owner.user_id, &new_batch, &allocated)
            .await?;

    tracing::info!(
        batch_id = created.batch.id,
        user_id = owner.user_id,
        count = created.generations.len(),
        seeded,
        "Batch created",
    );

    // Post-commit hand-off. Never fails the request: the durable part
    // of the contract already succeeded.
    DispatchCoordinator::new(state.pool.clone(), state.config.runner.clone())
        .dispatch(&created.batch, &created.generations)
        .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

// ---------------------------------------------------------------------------
// Read-back
// ---------------------------------------------------------------------------

/// GET /api/v1/batches/{id}
///
/// Fetch one of the caller's batches with its generations.
pub async fn get_batch(
    owner: OwnerIdentity,
    State(state): State<AppState>,
    Path(batch_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let batch = BatchRepo::find_by_id(&state.pool, owner.user_id, batch_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Batch",
            id: batch_id,
        }))?;

    let generations = GenerationRepo::list_by_batch(&state.pool, owner.user_id, batch_id).await?;

    Ok(Json(DataResponse {
        data: BatchDetail { batch, generations },
    }))
}

/// GET /api/v1/batches
///
/// List the caller's batches, newest first, with `limit`/`offset`
/// pagination.
pub async fn list_batches(
    owner: OwnerIdentity,
    State(state): State<AppState>,
    Query(params): Query<BatchListQuery>,
) -> AppResult<impl IntoResponse> {
    let batches = BatchRepo::list_by_owner(&state.pool, owner.user_id, &params).await?;
    Ok(Json(DataResponse { data: batches }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(item_count: u16) -> CreateBatchRequest {
        CreateBatchRequest {
            topic_id: 1,
            provider: "stability".to_string(),
            model: "sd-xl".to_string(),
            prompt: "a lighthouse at dusk".to_string(),
            width: 1024,
            height: 768,
            item_count,
            params: serde_json::json!({}),
        }
    }

    #[test]
    fn accepts_minimal_valid_request() {
        assert!(request(1).validate().is_ok());
    }

    #[test]
    fn rejects_zero_item_count() {
        assert!(request(0).validate().is_err());
    }

    #[test]
    fn rejects_empty_prompt() {
        let mut req = request(4);
        req.prompt.clear();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_dimensions() {
        let mut req = request(4);
        req.width = 16;
        assert!(req.validate().is_err());
    }

    #[test]
    fn params_are_optional() {
        let req: CreateBatchRequest = serde_json::from_value(serde_json::json!({
            "topicId": 1,
            "provider": "stability",
            "model": "sd-xl",
            "prompt": "p",
            "width": 512,
            "height": 512,
            "itemCount": 2,
        }))
        .unwrap();
        assert!(req.params.is_null());
    }
}
