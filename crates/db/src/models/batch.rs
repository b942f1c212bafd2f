//! Batch entity models and DTOs.

use easel_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::generation::GenerationWithTask;

/// A row from the `batches` table: one user request to produce N
/// derived artifacts from a single prompt/config.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Batch {
    pub id: DbId,
    pub owner_id: DbId,
    /// Parent topic/collection this batch was requested from.
    pub topic_id: DbId,
    pub provider: String,
    pub model: String,
    pub prompt: String,
    pub width: i32,
    pub height: i32,
    /// Sanitized provider parameters. Invariant: contains no string
    /// starting with `http://` or `https://` at any depth.
    pub config: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO for the transactional batch writer. `config` must already
/// be sanitized; the writer does not re-validate it.
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub topic_id: DbId,
    pub provider: String,
    pub model: String,
    pub prompt: String,
    pub width: i32,
    pub height: i32,
    pub config: serde_json::Value,
}

/// The committed result of the transactional batch writer: the batch
/// row plus its generation/task pairs in creation order.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedBatch {
    pub batch: Batch,
    pub generations: Vec<GenerationWithTask>,
}

/// Query parameters for `GET /api/v1/batches`.
#[derive(Debug, Deserialize)]
pub struct BatchListQuery {
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
