//! Repository for the `tasks` table.
//!
//! The orchestrator creates tasks as `pending` inside the batch
//! writer's transaction and marks them `error` only as a compensating
//! action when dispatch setup fails. Running/success transitions are
//! written by the worker runtime's reporting path.

use sqlx::{PgPool, Postgres, Transaction};

use easel_core::types::DbId;

use crate::models::status::TaskStatus;
use crate::models::task::{Task, TASK_TYPE_GENERATION};

/// Column list for `tasks` queries.
const COLUMNS: &str = "\
    id, owner_id, task_type, status_id, error_kind, error_message, \
    created_at, updated_at";

/// Provides lifecycle writes and owner-scoped reads for async tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a pending generation task inside the batch writer's
    /// transaction.
    pub async fn insert_pending(
        tx: &mut Transaction<'_, Postgres>,
        owner_id: DbId,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (owner_id, task_type, status_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(owner_id)
            .bind(TASK_TYPE_GENERATION)
            .bind(TaskStatus::Pending.id())
            .fetch_one(&mut **tx)
            .await
    }

    /// Mark a task as failed with an error kind and message.
    ///
    /// Returns `true` if a row was updated, `false` if no task matched
    /// the id/owner pair. Used by the dispatch compensation path, where
    /// each update is independent and best-effort.
    pub async fn mark_error(
        pool: &PgPool,
        owner_id: DbId,
        task_id: DbId,
        error_kind: &str,
        error_message: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks \
             SET status_id = $3, error_kind = $4, error_message = $5, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(task_id)
        .bind(owner_id)
        .bind(TaskStatus::Error.id())
        .bind(error_kind)
        .bind(error_message)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a task by ID, scoped to its owner.
    pub async fn find_by_id(
        pool: &PgPool,
        owner_id: DbId,
        id: DbId,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// List the tasks wired to a batch's generations, in generation
    /// creation order, scoped to the owner.
    pub async fn list_by_batch(
        pool: &PgPool,
        owner_id: DbId,
        batch_id: DbId,
    ) -> Result<Vec<Task>, sqlx::Error> {
        // Column names collide between the two tables, so the shared
        // COLUMNS const cannot be used here.
        let query = "\
            SELECT t.id, t.owner_id, t.task_type, t.status_id, \
                   t.error_kind, t.error_message, t.created_at, t.updated_at \
            FROM tasks t \
            JOIN generations g ON g.task_id = t.id \
            WHERE g.batch_id = $1 AND t.owner_id = $2 \
            ORDER BY g.id";
        sqlx::query_as::<_, Task>(query)
            .bind(batch_id)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }
}
