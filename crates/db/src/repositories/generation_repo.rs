//! Repository for the `generations` table.

use sqlx::{PgPool, Postgres, Transaction};

use easel_core::types::DbId;

use crate::models::generation::Generation;

/// Column list for `generations` queries.
const COLUMNS: &str = "id, batch_id, owner_id, seed, task_id, created_at";

/// Provides inserts (writer-internal) and owner-scoped reads for
/// generations.
pub struct GenerationRepo;

impl GenerationRepo {
    /// Insert a generation row inside the batch writer's transaction.
    /// `task_id` starts NULL and is set by [`GenerationRepo::set_task`]
    /// before the transaction commits.
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        batch_id: DbId,
        owner_id: DbId,
        seed: Option<i64>,
    ) -> Result<Generation, sqlx::Error> {
        let query = format!(
            "INSERT INTO generations (batch_id, owner_id, seed) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(batch_id)
            .bind(owner_id)
            .bind(seed)
            .fetch_one(&mut **tx)
            .await
    }

    /// Wire a generation to its task inside the writer's transaction.
    pub async fn set_task(
        tx: &mut Transaction<'_, Postgres>,
        generation_id: DbId,
        task_id: DbId,
    ) -> Result<Generation, sqlx::Error> {
        let query = format!(
            "UPDATE generations SET task_id = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(generation_id)
            .bind(task_id)
            .fetch_one(&mut **tx)
            .await
    }

    /// List a batch's generations in creation order, scoped to the owner.
    pub async fn list_by_batch(
        pool: &PgPool,
        owner_id: DbId,
        batch_id: DbId,
    ) -> Result<Vec<Generation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generations \
             WHERE batch_id = $1 AND owner_id = $2 \
             ORDER BY id"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(batch_id)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }
}
