//! Spend intake.
//!
//! The handler only validates and queues; the worker records the spend.
//! Callers follow up with the returned `task_id`.

use adpace_core::error::CoreError;
use adpace_core::money::validate_spend_amount;
use adpace_core::work::{SpendRequest, WorkItem};
use adpace_db::models::work_item::NewWorkItem;
use adpace_db::repositories::WorkItemRepo;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const REQUIRED_FIELDS: [&str; 3] = ["brand_id", "campaign_id", "amount"];

#[derive(Debug, Serialize)]
pub struct SpendQueued {
    pub success: bool,
    pub message: &'static str,
    pub task_id: Uuid,
}

/// POST /api/spend/
///
/// Validate a spend and queue it for recording. Responds `202 Accepted`.
pub async fn record_spend(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let request = parse_spend_request(&body)?;
    let (brand_id, campaign_id, amount) = (request.brand_id, request.campaign_id, request.amount);

    let item = WorkItem::RecordSpend(request);
    let row = WorkItemRepo::enqueue(&state.pool, &NewWorkItem::from_item(&item)).await?;

    tracing::info!(
        brand_id,
        campaign_id,
        %amount,
        task_id = %row.task_id,
        "Spend recording queued"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(SpendQueued {
            success: true,
            message: "Spend recording queued",
            task_id: row.task_id,
        }),
    ))
}

/// Parse and validate the request body.
///
/// Missing fields and malformed values are reported individually; the
/// amount is normalized to two decimals and must be positive and within
/// `MAX_AMOUNT`.
pub fn parse_spend_request(body: &[u8]) -> Result<SpendRequest, AppError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|_| AppError::BadRequest("Invalid JSON in request body".to_string()))?;

    let Some(fields) = value.as_object() else {
        return Err(AppError::BadRequest("Request body must be a JSON object".to_string()));
    };
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !fields.contains_key(**f)) {
        return Err(CoreError::Validation(format!("Missing required field: {missing}")).into());
    }

    let mut request: SpendRequest = serde_json::from_value(value)
        .map_err(|e| CoreError::Validation(format!("Invalid input: {e}")))?;
    request.amount = validate_spend_amount(request.amount)?;
    Ok(request)
}
