//! Dispatch compensation tests: when the runner client cannot even be
//! constructed, every task of the batch must end up `error` instead of
//! `pending` forever — and one failed update must not stop the rest.

use sqlx::PgPool;

use easel_api::engine::DispatchCoordinator;
use easel_db::models::batch::NewBatch;
use easel_db::models::status::TaskStatus;
use easel_db::repositories::{BatchRepo, TaskRepo};
use easel_runner::RunnerConfig;

fn new_batch() -> NewBatch {
    NewBatch {
        topic_id: 3,
        provider: "stability".to_string(),
        model: "sd-xl".to_string(),
        prompt: "a fox in tall grass".to_string(),
        width: 512,
        height: 512,
        config: serde_json::json!({ "seed": null, "imageUrls": ["uploads/ref.png"] }),
    }
}

/// Runner config whose client construction always fails: minting the
/// dispatch token requires a secret.
fn broken_runner() -> RunnerConfig {
    RunnerConfig {
        base_url: "http://runner.test:8700".to_string(),
        token_secret: String::new(),
        token_ttl_secs: 300,
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn failed_client_construction_errors_every_task(pool: PgPool) {
    let seeds = vec![Some(1), Some(2), Some(3), Some(4)];
    let created = BatchRepo::create_with_generations(&pool, 1, &new_batch(), &seeds)
        .await
        .unwrap();

    DispatchCoordinator::new(pool.clone(), broken_runner())
        .dispatch(&created.batch, &created.generations)
        .await;

    let tasks = TaskRepo::list_by_batch(&pool, 1, created.batch.id)
        .await
        .unwrap();
    assert_eq!(tasks.len(), 4);
    for task in tasks {
        assert_eq!(task.status_id, TaskStatus::Error.id());
        assert_eq!(task.error_kind.as_deref(), Some("dispatch_setup"));
        assert!(task
            .error_message
            .as_deref()
            .is_some_and(|m| !m.is_empty()));
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn compensation_settles_remaining_tasks_when_one_update_fails(pool: PgPool) {
    let created = BatchRepo::create_with_generations(&pool, 1, &new_batch(), &[None, None, None])
        .await
        .unwrap();

    // Remove the middle task out from under the coordinator so its
    // compensating update finds nothing to write.
    let missing_task = created.generations[1].task.id;
    sqlx::query("UPDATE generations SET task_id = NULL WHERE task_id = $1")
        .bind(missing_task)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(missing_task)
        .execute(&pool)
        .await
        .unwrap();

    DispatchCoordinator::new(pool.clone(), broken_runner())
        .dispatch(&created.batch, &created.generations)
        .await;

    // The surviving tasks were still settled.
    for pair in [&created.generations[0], &created.generations[2]] {
        let task = TaskRepo::find_by_id(&pool, 1, pair.task.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.status_id, TaskStatus::Error.id());
    }
}
