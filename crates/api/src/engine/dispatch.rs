//! Post-commit hand-off of a batch's generations to the runner.
//!
//! Dispatch only ever sees committed rows: the coordinator runs after
//! the batch writer's transaction, so a rolled-back generation can
//! never be handed to the runner. The request path blocks only on
//! constructing the dispatch client; the per-generation invocations are
//! spawned and never awaited. If the client cannot even be constructed,
//! every task in the batch is marked `error` so nothing stays `pending`
//! forever — best-effort, since the batch itself already committed.

use std::sync::Arc;

use sqlx::PgPool;

use easel_db::models::batch::Batch;
use easel_db::models::generation::GenerationWithTask;
use easel_db::repositories::TaskRepo;
use easel_runner::{RunnerClient, RunnerConfig, RunnerIdentity, StartGeneration};

/// `error_kind` recorded when dispatch setup fails before any worker
/// could run.
pub const ERROR_KIND_DISPATCH_SETUP: &str = "dispatch_setup";

/// Hands committed generation/task pairs to the runner, fire-and-forget.
pub struct DispatchCoordinator {
    pool: PgPool,
    runner: RunnerConfig,
}

impl DispatchCoordinator {
    pub fn new(pool: PgPool, runner: RunnerConfig) -> Self {
        Self { pool, runner }
    }

    /// Initiate one start-generation invocation per pair.
    ///
    /// Never returns an error: the caller's request already succeeded
    /// when the batch committed. Invocations are spawned as independent
    /// tasks with no ordering between them; a slow or failing one does
    /// not affect the rest. Individual invocation errors are the worker
    /// subsystem's concern and are only logged here.
    pub async fn dispatch(&self, batch: &Batch, pairs: &[GenerationWithTask]) {
        let identity = RunnerIdentity {
            user_id: batch.owner_id,
        };

        let client = match RunnerClient::connect(&self.runner, identity).await {
            Ok(client) => Arc::new(client),
            Err(e) => {
                tracing::error!(
                    batch_id = batch.id,
                    count = pairs.len(),
                    error = %e,
                    "Dispatch setup failed, marking batch tasks as errored",
                );
                self.fail_all_tasks(batch, pairs, &e.to_string()).await;
                return;
            }
        };

        for pair in pairs {
            let client = Arc::clone(&client);
            let request = StartGeneration {
                task_id: pair.task.id,
                generation_id: pair.generation.id,
                model: batch.model.clone(),
                provider: batch.provider.clone(),
                params: batch.config.clone(),
            };
            tokio::spawn(async move {
                if let Err(e) = client.start_generation(&request).await {
                    // Status reporting for accepted work belongs to the
                    // runner; a rejected hand-off is only logged here.
                    tracing::warn!(
                        task_id = request.task_id,
                        generation_id = request.generation_id,
                        error = %e,
                        "start-generation invocation failed",
                    );
                }
            });
        }

        tracing::info!(
            batch_id = batch.id,
            count = pairs.len(),
            "Dispatch initiated for batch",
        );
    }

    /// Compensation: mark every task in the batch as errored.
    ///
    /// The updates are independent and settle-all: a failure on one
    /// task is logged and the rest are still attempted. Nothing
    /// propagates to the caller.
    async fn fail_all_tasks(&self, batch: &Batch, pairs: &[GenerationWithTask], reason: &str) {
        let message = format!("Dispatch setup failed: {reason}");

        let updates = pairs.iter().map(|pair| {
            let pool = self.pool.clone();
            let message = message.clone();
            let owner_id = batch.owner_id;
            let task_id = pair.task.id;
            async move {
                match TaskRepo::mark_error(
                    &pool,
                    owner_id,
                    task_id,
                    ERROR_KIND_DISPATCH_SETUP,
                    &message,
                )
                .await
                {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::error!(task_id, "Compensation found no task row to update");
                    }
                    Err(e) => {
                        tracing::error!(
                            task_id,
                            error = %e,
                            "Compensation update failed",
                        );
                    }
                }
            }
        });

        futures::future::join_all(updates).await;
    }
}
