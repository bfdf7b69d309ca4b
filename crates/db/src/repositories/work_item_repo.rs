//! Repository for the `work_items` queue table.
//!
//! Uses `WorkItemStatus` from `models::status` for every status write.

use std::time::Duration;

use adpace_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::status::WorkItemStatus;
use crate::models::work_item::{NewWorkItem, WorkItemRow};

const COLUMNS: &str = "id, task_id, kind, payload, status_id, attempts, max_attempts, \
                       run_after, claimed_at, finished_at, last_error, result, \
                       created_at, updated_at";

/// Enqueue, claim and settle deferred work.
pub struct WorkItemRepo;

impl WorkItemRepo {
    /// Insert a pending item that is runnable immediately.
    pub async fn enqueue<'e, E>(executor: E, input: &NewWorkItem) -> Result<WorkItemRow, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO work_items (task_id, kind, payload, status_id, max_attempts)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkItemRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.kind)
            .bind(&input.payload)
            .bind(WorkItemStatus::Pending.id())
            .bind(input.max_attempts)
            .fetch_one(executor)
            .await
    }

    /// Atomically claim the oldest runnable pending item and count the
    /// attempt.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent dispatchers never
    /// claim the same row.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<WorkItemRow>, sqlx::Error> {
        let query = format!(
            "UPDATE work_items \
             SET status_id = $1, attempts = attempts + 1, claimed_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM work_items \
                 WHERE status_id = $2 AND run_after <= NOW() \
                 ORDER BY run_after ASC, id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkItemRow>(&query)
            .bind(WorkItemStatus::Running.id())
            .bind(WorkItemStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Mark an item completed with its result payload.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        result: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE work_items \
             SET status_id = $2, result = $3, finished_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(WorkItemStatus::Completed.id())
        .bind(result)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Put a failed attempt back in the queue, runnable after `delay`.
    pub async fn schedule_retry(
        pool: &PgPool,
        id: DbId,
        error: &str,
        delay: Duration,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE work_items \
             SET status_id = $2, last_error = $3, claimed_at = NULL, \
                 run_after = NOW() + make_interval(secs => $4) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(WorkItemStatus::Pending.id())
        .bind(error)
        .bind(delay.as_secs_f64())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark an item terminally failed after its last attempt.
    pub async fn fail(
        pool: &PgPool,
        id: DbId,
        error: &str,
        result: Option<&serde_json::Value>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE work_items \
             SET status_id = $2, last_error = $3, result = $4, finished_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(WorkItemStatus::Failed.id())
        .bind(error)
        .bind(result)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_task_id(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Option<WorkItemRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_items WHERE task_id = $1");
        sqlx::query_as::<_, WorkItemRow>(&query)
            .bind(task_id)
            .fetch_optional(pool)
            .await
    }

    /// Return items stuck in RUNNING since before `claimed_before` to the
    /// queue. A worker that dies mid-item leaves such rows behind.
    pub async fn release_stale(pool: &PgPool, claimed_before: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE work_items \
             SET status_id = $1, claimed_at = NULL, run_after = NOW() \
             WHERE status_id = $2 AND claimed_at < $3",
        )
        .bind(WorkItemStatus::Pending.id())
        .bind(WorkItemStatus::Running.id())
        .bind(claimed_before)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete completed and failed items that finished before `cutoff`.
    pub async fn purge_finished_before(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM work_items WHERE status_id IN ($1, $2) AND finished_at < $3",
        )
        .bind(WorkItemStatus::Completed.id())
        .bind(WorkItemStatus::Failed.id())
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
