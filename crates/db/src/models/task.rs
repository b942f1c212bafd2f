//! Async task entity models.

use easel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::StatusId;

/// Task type tag for image/artifact generation work.
pub const TASK_TYPE_GENERATION: &str = "generation";

/// A row from the `tasks` table: the durable lifecycle record for one
/// unit of background work, referenced 1:1 from a generation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub owner_id: DbId,
    pub task_type: String,
    pub status_id: StatusId,
    /// Machine-readable error category, set together with `error_message`.
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
