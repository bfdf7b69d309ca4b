//! Work queue row model and DTOs.

use adpace_core::types::{DbId, Timestamp};
use adpace_core::work::WorkItem;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{StatusId, WorkItemStatus};

/// A row from the `work_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkItemRow {
    pub id: DbId,
    /// Public handle returned to API and CLI callers.
    pub task_id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub status_id: StatusId,
    pub attempts: i32,
    pub max_attempts: i32,
    pub run_after: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub last_error: Option<String>,
    pub result: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WorkItemRow {
    pub fn status(&self) -> Option<WorkItemStatus> {
        WorkItemStatus::from_id(self.status_id)
    }
}

/// DTO for enqueueing a unit of work.
#[derive(Debug, Clone)]
pub struct NewWorkItem {
    pub kind: String,
    pub payload: serde_json::Value,
    pub max_attempts: i32,
}

impl NewWorkItem {
    /// Row for `item`, with the attempt budget of its retry policy.
    pub fn from_item(item: &WorkItem) -> Self {
        let max_attempts = item.retry_policy().max_attempts;
        Self {
            kind: item.kind().to_string(),
            payload: item.payload(),
            max_attempts: i32::try_from(max_attempts).unwrap_or(i32::MAX),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = i32::try_from(max_attempts.max(1)).unwrap_or(i32::MAX);
        self
    }
}
