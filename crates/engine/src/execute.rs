//! Run one [`WorkItem`] and shape its stored result.
//!
//! Caller errors (bad input, unknown brand or campaign) are final: they
//! come back as `Ok({ "success": false, "error": ... })` so the work item
//! completes instead of being retried. Anything else is returned as an
//! error for the dispatcher to classify.

use adpace_core::types::Timestamp;
use adpace_core::work::{failure_result, success_result, WorkItem};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::error::EngineResult;
use crate::spend;
use crate::sweeps::{self, SweepOptions};

pub async fn execute(
    pool: &PgPool,
    item: &WorkItem,
    now: Timestamp,
    options: SweepOptions,
    cancel: &CancellationToken,
) -> EngineResult<serde_json::Value> {
    let outcome = match item {
        WorkItem::RecordSpend(request) => spend::record_spend(pool, request, now)
            .await
            .map(|recorded| success_result(&recorded)),
        WorkItem::Sweep(kind) => sweeps::run(pool, *kind, now, options, cancel)
            .await
            .map(|report| success_result(&report)),
    };

    match outcome {
        Ok(value) => Ok(value),
        Err(e) if e.is_caller_error() => {
            tracing::warn!(kind = item.kind(), error = %e, "Work item rejected");
            Ok(failure_result(&e.to_string()))
        }
        Err(e) => Err(e),
    }
}
