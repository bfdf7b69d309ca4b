//! Cron-style trigger for reconciliation sweeps.
//!
//! Ticks every `scheduler_tick`, works out which sweeps fell due in the
//! minutes since the previous tick (UTC calendar, see
//! [`adpace_core::schedule`]) and enqueues one work item per due sweep.
//! The sweeps then run through the dispatcher like any other item.

use std::time::Duration;

use adpace_core::schedule::{due_between, SweepKind};
use adpace_core::types::Timestamp;
use adpace_core::work::WorkItem;
use adpace_db::models::work_item::{NewWorkItem, WorkItemRow};
use adpace_db::repositories::WorkItemRepo;
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;

pub struct Scheduler {
    pool: PgPool,
    tick: Duration,
    sweep_max_attempts: u32,
}

impl Scheduler {
    pub fn new(pool: PgPool, config: &WorkerConfig) -> Self {
        Self {
            pool,
            tick: config.scheduler_tick,
            sweep_max_attempts: config.sweep_max_attempts,
        }
    }

    /// Run until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick);
        let mut last = Utc::now();
        tracing::info!(tick_secs = self.tick.as_secs(), "Sweep scheduler started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Sweep scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let now = Utc::now();
                    match self.enqueue_due(last, now).await {
                        // A failed tick keeps `last`, so the same minutes are
                        // reconsidered next time.
                        Ok(_) => last = now,
                        Err(e) => tracing::error!(error = %e, "Failed to enqueue due sweeps"),
                    }
                }
            }
        }
    }

    /// Enqueue every sweep due in `(last, now]`.
    pub async fn enqueue_due(
        &self,
        last: Timestamp,
        now: Timestamp,
    ) -> Result<Vec<SweepKind>, sqlx::Error> {
        let due = due_between(last, now);
        for kind in &due {
            let row = enqueue_sweep(&self.pool, *kind, self.sweep_max_attempts).await?;
            tracing::info!(sweep = %kind, task_id = %row.task_id, "Sweep enqueued");
        }
        Ok(due)
    }
}

/// Queue one run of `kind` with the given attempt budget.
pub async fn enqueue_sweep(
    pool: &PgPool,
    kind: SweepKind,
    max_attempts: u32,
) -> Result<WorkItemRow, sqlx::Error> {
    let item = WorkItem::Sweep(kind);
    WorkItemRepo::enqueue(pool, &NewWorkItem::from_item(&item).with_max_attempts(max_attempts))
        .await
}
