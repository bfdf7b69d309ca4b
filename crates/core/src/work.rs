//! Deferred work messages and their result payloads.
//!
//! A [`WorkItem`] is persisted as two columns, `kind` and `payload`, in the
//! `work_items` table. The API and the scheduler build one and enqueue it;
//! the worker's dispatcher claims the row and rebuilds the item with
//! [`WorkItem::from_parts`].

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::CoreError;
use crate::money::deserialize_amount;
use crate::retry::RetryPolicy;
use crate::schedule::SweepKind;
use crate::types::{DbId, Money, Timestamp};

/// `kind` column value for spend recording.
pub const KIND_RECORD_SPEND: &str = "record_spend";

/// Input of the spend recording operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendRequest {
    pub brand_id: DbId,
    pub campaign_id: DbId,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Money,
    /// Defaults to the moment the work item executes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spend_datetime: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkItem {
    RecordSpend(SpendRequest),
    Sweep(SweepKind),
}

impl WorkItem {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkItem::RecordSpend(_) => KIND_RECORD_SPEND,
            WorkItem::Sweep(kind) => kind.as_str(),
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        match self {
            WorkItem::RecordSpend(req) => json!(req),
            WorkItem::Sweep(_) => json!({}),
        }
    }

    /// Rebuild an item from its stored `kind` and `payload`.
    pub fn from_parts(kind: &str, payload: &serde_json::Value) -> Result<Self, CoreError> {
        if kind == KIND_RECORD_SPEND {
            let req = serde_json::from_value::<SpendRequest>(payload.clone())
                .map_err(|e| CoreError::Validation(format!("Malformed spend payload: {e}")))?;
            return Ok(WorkItem::RecordSpend(req));
        }
        kind.parse::<SweepKind>().map(WorkItem::Sweep)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            WorkItem::RecordSpend(_) => RetryPolicy::spend_recording(),
            WorkItem::Sweep(kind) => kind.retry_policy(),
        }
    }
}

// ---------------------------------------------------------------------------
// Result payloads
// ---------------------------------------------------------------------------

/// Successful outcome of recording one spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendRecorded {
    pub spend_record_id: DbId,
    pub daily_remaining: Money,
    pub monthly_remaining: Money,
    pub campaign_paused: bool,
}

/// Counts reported by one reconciliation sweep run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub sweep: SweepKind,
    /// Entities (campaigns, brands or rows) the sweep looked at.
    pub examined: u64,
    /// Entities it changed.
    pub mutated: u64,
    /// Entities that raised an error and were skipped.
    pub failed: u64,
    /// Stopped early because shutdown was requested.
    #[serde(default)]
    pub cancelled: bool,
}

impl SweepReport {
    pub fn new(sweep: SweepKind) -> Self {
        Self {
            sweep,
            examined: 0,
            mutated: 0,
            failed: 0,
            cancelled: false,
        }
    }
}

/// Wrap a serializable outcome as `{ "success": true, ...fields }`.
pub fn success_result<T: Serialize>(outcome: &T) -> serde_json::Value {
    let mut value = json!(outcome);
    if let Some(map) = value.as_object_mut() {
        map.insert("success".to_string(), json!(true));
    }
    value
}

/// `{ "success": false, "error": message }`.
pub fn failure_result(message: &str) -> serde_json::Value {
    json!({ "success": false, "error": message })
}
