//! Generation entity models.

use easel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::task::Task;

/// A row from the `generations` table: one unit of output within a
/// batch, wired 1:1 to an async task.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Generation {
    pub id: DbId,
    pub batch_id: DbId,
    pub owner_id: DbId,
    /// `Some` with a batch-unique value for seed-capable providers,
    /// `None` otherwise.
    pub seed: Option<i64>,
    /// Populated in the same transaction that creates the row; only
    /// transiently `None` inside the writer.
    pub task_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// A generation together with the task tracking its execution, in batch
/// creation order.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationWithTask {
    pub generation: Generation,
    pub task: Task,
}
