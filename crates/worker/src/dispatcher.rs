//! Queue dispatcher.
//!
//! Polls `work_items` every `poll_interval` and runs claimed items through
//! [`adpace_engine::execute::execute`]. Claims use
//! `FOR UPDATE SKIP LOCKED` (see [`WorkItemRepo::claim_next`]), so any
//! number of dispatchers, in this process or others, can share the queue.

use std::time::Duration;

use adpace_core::retry::RetryPolicy;
use adpace_core::work::{failure_result, WorkItem};
use adpace_db::models::work_item::WorkItemRow;
use adpace_db::repositories::WorkItemRepo;
use adpace_engine::execute::execute;
use adpace_engine::sweeps::SweepOptions;
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;

/// Items claimed longer ago than this are assumed orphaned by a dead worker.
pub const STALE_CLAIM_AFTER: Duration = Duration::from_secs(15 * 60);

/// What happened to a claimed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Completed,
    /// Back in the queue, runnable after the delay.
    Retried(Duration),
    Failed,
}

pub struct Dispatcher {
    pool: PgPool,
    poll_interval: Duration,
    options: SweepOptions,
}

impl Dispatcher {
    pub fn new(pool: PgPool, config: &WorkerConfig) -> Self {
        Self {
            pool,
            poll_interval: config.poll_interval,
            options: SweepOptions {
                retention_days: config.retention_days,
            },
        }
    }

    /// Run the dispatch loop until the cancellation token is triggered.
    pub async fn run(&self, worker: usize, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            worker,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Dispatcher started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(worker, "Dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.drain(&cancel).await {
                        tracing::error!(worker, error = %e, "Dispatch cycle failed");
                    }
                }
            }
        }
    }

    /// Process items until the queue is empty or shutdown is requested.
    pub async fn drain(&self, cancel: &CancellationToken) -> Result<usize, sqlx::Error> {
        let mut processed = 0;
        while !cancel.is_cancelled() {
            if self.process_next(cancel).await?.is_none() {
                break;
            }
            processed += 1;
        }
        Ok(processed)
    }

    /// Claim and run one item. `None` when nothing is runnable.
    pub async fn process_next(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<Disposition>, sqlx::Error> {
        let Some(row) = WorkItemRepo::claim_next(&self.pool).await? else {
            return Ok(None);
        };
        tracing::debug!(
            task_id = %row.task_id,
            kind = %row.kind,
            attempt = row.attempts,
            "Work item claimed",
        );

        let item = match WorkItem::from_parts(&row.kind, &row.payload) {
            Ok(item) => item,
            Err(e) => {
                tracing::error!(
                    task_id = %row.task_id,
                    kind = %row.kind,
                    error = %e,
                    "Malformed work item",
                );
                let message = e.to_string();
                WorkItemRepo::fail(&self.pool, row.id, &message, Some(&failure_result(&message)))
                    .await?;
                return Ok(Some(Disposition::Failed));
            }
        };

        let disposition = match execute(&self.pool, &item, Utc::now(), self.options, cancel).await {
            Ok(result) => {
                WorkItemRepo::complete(&self.pool, row.id, &result).await?;
                tracing::info!(task_id = %row.task_id, kind = %row.kind, "Work item completed");
                Disposition::Completed
            }
            Err(e) => {
                let message = e.to_string();
                let disposition = settle_error(&row, &item.retry_policy(), e.is_transient());
                match disposition {
                    Disposition::Retried(delay) => {
                        tracing::warn!(
                            task_id = %row.task_id,
                            kind = %row.kind,
                            attempt = row.attempts,
                            max_attempts = row.max_attempts,
                            retry_in_secs = delay.as_secs(),
                            error = %message,
                            "Work item failed, retrying",
                        );
                        WorkItemRepo::schedule_retry(&self.pool, row.id, &message, delay).await?;
                    }
                    _ => {
                        tracing::error!(
                            task_id = %row.task_id,
                            kind = %row.kind,
                            attempts = row.attempts,
                            payload = %row.payload,
                            error = %message,
                            "Work item failed permanently",
                        );
                        WorkItemRepo::fail(
                            &self.pool,
                            row.id,
                            &message,
                            Some(&failure_result(&message)),
                        )
                        .await?;
                    }
                }
                disposition
            }
        };

        Ok(Some(disposition))
    }

    /// Requeue items left RUNNING by a worker that died.
    pub async fn release_stale(&self) -> Result<u64, sqlx::Error> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(STALE_CLAIM_AFTER).unwrap_or(chrono::Duration::zero());
        let released = WorkItemRepo::release_stale(&self.pool, cutoff).await?;
        if released > 0 {
            tracing::warn!(released, "Requeued stale work items");
        }
        Ok(released)
    }
}

/// Retry transient failures while the row has attempts left; everything
/// else is terminal. `row.attempts` already counts the current attempt.
pub fn settle_error(row: &WorkItemRow, policy: &RetryPolicy, transient: bool) -> Disposition {
    let attempts = u32::try_from(row.attempts).unwrap_or(0);
    let max_attempts = u32::try_from(row.max_attempts).unwrap_or(0);

    if transient && attempts < max_attempts {
        Disposition::Retried(policy.delay_for(attempts))
    } else {
        Disposition::Failed
    }
}
