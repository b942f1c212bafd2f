//! Transactional batch writer tests: atomicity, the 1:1
//! generation/task mapping, and owner scoping.

use sqlx::PgPool;

use easel_db::models::batch::{BatchListQuery, NewBatch};
use easel_db::models::status::TaskStatus;
use easel_db::repositories::{BatchRepo, GenerationRepo, TaskRepo};

fn new_batch() -> NewBatch {
    NewBatch {
        topic_id: 7,
        provider: "stability".to_string(),
        model: "sd-xl".to_string(),
        prompt: "a lighthouse at dusk".to_string(),
        width: 1024,
        height: 768,
        config: serde_json::json!({ "steps": 30, "imageUrls": ["uploads/ref.png"] }),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn creates_one_batch_n_generations_n_tasks(pool: PgPool) {
    let seeds = vec![Some(11), Some(22), Some(33), Some(44)];
    let created = BatchRepo::create_with_generations(&pool, 1, &new_batch(), &seeds)
        .await
        .unwrap();

    assert_eq!(created.batch.owner_id, 1);
    assert_eq!(created.batch.prompt, "a lighthouse at dusk");
    assert_eq!(created.generations.len(), 4);

    // Seeds land in creation order; every generation is wired to a
    // distinct pending task.
    let mut task_ids = Vec::new();
    for (pair, seed) in created.generations.iter().zip(&seeds) {
        assert_eq!(pair.generation.seed, *seed);
        assert_eq!(pair.generation.batch_id, created.batch.id);
        assert_eq!(pair.generation.task_id, Some(pair.task.id));
        assert_eq!(pair.task.status_id, TaskStatus::Pending.id());
        task_ids.push(pair.task.id);
    }
    task_ids.sort_unstable();
    task_ids.dedup();
    assert_eq!(task_ids.len(), 4);

    // Row counts match the committed result.
    let (batches, generations, tasks): (i64, i64, i64) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM batches), \
                (SELECT COUNT(*) FROM generations), \
                (SELECT COUNT(*) FROM tasks)",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!((batches, generations, tasks), (1, 4, 4));
}

#[sqlx::test(migrations = "./migrations")]
async fn mid_transaction_failure_rolls_back_everything(pool: PgPool) {
    // The third seed violates ck_generations_seed_non_negative, so the
    // batch row and the first two generation/task pairs were already
    // written inside the transaction when the failure hits.
    let seeds = vec![Some(1), Some(2), Some(-3), Some(4)];
    let result = BatchRepo::create_with_generations(&pool, 1, &new_batch(), &seeds).await;
    assert!(result.is_err());

    let (batches, generations, tasks): (i64, i64, i64) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM batches), \
                (SELECT COUNT(*) FROM generations), \
                (SELECT COUNT(*) FROM tasks)",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!((batches, generations, tasks), (0, 0, 0));

    let listed = BatchRepo::list_by_owner(
        &pool,
        1,
        &BatchListQuery {
            limit: None,
            offset: None,
        },
    )
    .await
    .unwrap();
    assert!(listed.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn task_cannot_back_two_generations(pool: PgPool) {
    let created = BatchRepo::create_with_generations(&pool, 1, &new_batch(), &[None, None])
        .await
        .unwrap();

    let first_task = created.generations[0].task.id;
    let second_gen = created.generations[1].generation.id;

    // Rewiring the second generation onto the first task must trip
    // uq_generations_task_id.
    let err = sqlx::query("UPDATE generations SET task_id = $2 WHERE id = $1")
        .bind(second_gen)
        .bind(first_task)
        .execute(&pool)
        .await
        .unwrap_err();

    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.code().as_deref(), Some("23505"));
        }
        other => panic!("expected unique violation, got: {other}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn mark_error_updates_status_and_message(pool: PgPool) {
    let created = BatchRepo::create_with_generations(&pool, 1, &new_batch(), &[None])
        .await
        .unwrap();
    let task_id = created.generations[0].task.id;

    let updated = TaskRepo::mark_error(&pool, 1, task_id, "dispatch_setup", "runner unreachable")
        .await
        .unwrap();
    assert!(updated);

    let task = TaskRepo::find_by_id(&pool, 1, task_id).await.unwrap().unwrap();
    assert_eq!(task.status_id, TaskStatus::Error.id());
    assert_eq!(task.error_kind.as_deref(), Some("dispatch_setup"));
    assert_eq!(task.error_message.as_deref(), Some("runner unreachable"));
}

#[sqlx::test(migrations = "./migrations")]
async fn mark_error_is_a_noop_for_unknown_or_foreign_tasks(pool: PgPool) {
    let created = BatchRepo::create_with_generations(&pool, 1, &new_batch(), &[None])
        .await
        .unwrap();
    let task_id = created.generations[0].task.id;

    // Unknown id.
    assert!(!TaskRepo::mark_error(&pool, 1, 999_999, "dispatch_setup", "x")
        .await
        .unwrap());

    // Wrong owner: the row must not change.
    assert!(!TaskRepo::mark_error(&pool, 2, task_id, "dispatch_setup", "x")
        .await
        .unwrap());
    let task = TaskRepo::find_by_id(&pool, 1, task_id).await.unwrap().unwrap();
    assert_eq!(task.status_id, TaskStatus::Pending.id());
}

#[sqlx::test(migrations = "./migrations")]
async fn reads_are_owner_scoped(pool: PgPool) {
    let created = BatchRepo::create_with_generations(&pool, 1, &new_batch(), &[Some(5)])
        .await
        .unwrap();
    let batch_id = created.batch.id;

    assert!(BatchRepo::find_by_id(&pool, 1, batch_id)
        .await
        .unwrap()
        .is_some());
    assert!(BatchRepo::find_by_id(&pool, 2, batch_id)
        .await
        .unwrap()
        .is_none());

    assert_eq!(
        GenerationRepo::list_by_batch(&pool, 1, batch_id)
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(GenerationRepo::list_by_batch(&pool, 2, batch_id)
        .await
        .unwrap()
        .is_empty());

    assert_eq!(
        TaskRepo::list_by_batch(&pool, 1, batch_id).await.unwrap().len(),
        1
    );
    assert!(TaskRepo::list_by_batch(&pool, 2, batch_id)
        .await
        .unwrap()
        .is_empty());
}
