//! Repository for the `batches` table, including the transactional
//! batch writer.
//!
//! Creating a batch is indivisible: one batch row, N generation rows,
//! and N task rows either all commit together or none of them exist.
//! Dispatch to the worker runtime is strictly a post-commit concern and
//! never happens in here.

use sqlx::{PgPool, Postgres, Transaction};

use easel_core::types::DbId;

use crate::models::batch::{Batch, BatchListQuery, CreatedBatch, NewBatch};
use crate::models::generation::GenerationWithTask;

use super::generation_repo::GenerationRepo;
use super::task_repo::TaskRepo;

/// Column list for `batches` queries.
const COLUMNS: &str = "\
    id, owner_id, topic_id, provider, model, prompt, \
    width, height, config, created_at, updated_at";

/// Maximum page size for batch listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for batch listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides creation and owner-scoped reads for generation batches.
pub struct BatchRepo;

impl BatchRepo {
    /// Atomically create one batch, `seeds.len()` generations, and one
    /// pending task per generation, wiring each generation to its task.
    ///
    /// Everything runs inside a single transaction: any failure rolls
    /// back all three tables, so a partially-created batch is never
    /// observable. Returns the committed rows, generations in creation
    /// order.
    pub async fn create_with_generations(
        pool: &PgPool,
        owner_id: DbId,
        input: &NewBatch,
        seeds: &[Option<i64>],
    ) -> Result<CreatedBatch, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let batch = Self::insert_batch(&mut tx, owner_id, input).await?;

        let mut generations = Vec::with_capacity(seeds.len());
        for &seed in seeds {
            let generation =
                GenerationRepo::insert(&mut tx, batch.id, owner_id, seed).await?;
            let task = TaskRepo::insert_pending(&mut tx, owner_id).await?;
            let generation =
                GenerationRepo::set_task(&mut tx, generation.id, task.id).await?;
            generations.push(GenerationWithTask { generation, task });
        }

        tx.commit().await?;

        Ok(CreatedBatch { batch, generations })
    }

    /// Insert the batch row and return it.
    async fn insert_batch(
        tx: &mut Transaction<'_, Postgres>,
        owner_id: DbId,
        input: &NewBatch,
    ) -> Result<Batch, sqlx::Error> {
        let query = format!(
            "INSERT INTO batches \
                 (owner_id, topic_id, provider, model, prompt, width, height, config) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(owner_id)
            .bind(input.topic_id)
            .bind(&input.provider)
            .bind(&input.model)
            .bind(&input.prompt)
            .bind(input.width)
            .bind(input.height)
            .bind(&input.config)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a batch by ID, scoped to its owner.
    pub async fn find_by_id(
        pool: &PgPool,
        owner_id: DbId,
        id: DbId,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM batches WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, Batch>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's batches, newest first, with pagination.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
        params: &BatchListQuery,
    ) -> Result<Vec<Batch>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);

        let query = format!(
            "SELECT {COLUMNS} FROM batches \
             WHERE owner_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
