//! Campaign status and manual toggle.

use adpace_core::campaign_status::CampaignStatus;
use adpace_core::dayparting::day_name;
use adpace_core::error::CoreError;
use adpace_core::money::normalize;
use adpace_core::types::{DbId, Money};
use adpace_db::models::dayparting_schedule::DaypartingSchedule;
use adpace_db::repositories::CampaignRepo;
use adpace_engine::{campaigns, ledger};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CampaignStatusData {
    pub campaign_id: DbId,
    pub campaign_name: String,
    pub brand_name: String,
    pub status: CampaignStatus,
    pub is_active: bool,
    pub can_run_now: bool,
    pub is_within_dayparting: bool,
    pub brand_budget_status: BudgetSnapshot,
    pub dayparting_schedules: Vec<ScheduleView>,
}

#[derive(Debug, Serialize)]
pub struct BudgetSnapshot {
    pub has_budget_remaining: bool,
    pub daily_spent: Money,
    pub daily_budget: Money,
    pub daily_remaining: Money,
    pub monthly_spent: Money,
    pub monthly_budget: Money,
    pub monthly_remaining: Money,
}

#[derive(Debug, Serialize)]
pub struct ScheduleView {
    pub day_of_week: i16,
    pub day_name: &'static str,
    pub start_hour: i16,
    pub end_hour: i16,
    pub is_active: bool,
}

impl From<&DaypartingSchedule> for ScheduleView {
    fn from(s: &DaypartingSchedule) -> Self {
        Self {
            day_of_week: s.day_of_week,
            day_name: day_name(s.day_of_week),
            start_hour: s.start_hour,
            end_hour: s.end_hour,
            is_active: s.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub message: String,
    pub new_status: CampaignStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToggleAction {
    Activate,
    Deactivate,
}

fn parse_toggle_action(body: &[u8]) -> Result<ToggleAction, AppError> {
    let request: ToggleRequest = serde_json::from_slice(body)
        .map_err(|_| AppError::BadRequest("Invalid JSON in request body".to_string()))?;
    match request.action.as_deref() {
        Some("activate") => Ok(ToggleAction::Activate),
        Some("deactivate") => Ok(ToggleAction::Deactivate),
        _ => Err(CoreError::Validation(
            "Action must be \"activate\" or \"deactivate\"".to_string(),
        )
        .into()),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/campaigns/{id}/status/
///
/// Status, eligibility, today's brand budget and active schedules of an
/// enabled campaign. Creates today's budget summary if it does not exist.
pub async fn campaign_status(
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let campaign = CampaignRepo::find_active_by_id(&state.pool, campaign_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id: campaign_id,
        }))?;

    let summary =
        ledger::get_or_create_summary(&state.pool, campaign.brand_id, now.date_naive()).await?;

    let mut conn = state.pool.acquire().await?;
    let snapshot = campaigns::snapshot(&mut conn, campaign, now).await?;

    let data = CampaignStatusData {
        campaign_id: snapshot.campaign.id,
        campaign_name: snapshot.campaign.name.clone(),
        brand_name: snapshot.brand.name.clone(),
        status: snapshot.status,
        is_active: snapshot.campaign.is_active,
        can_run_now: snapshot.can_run_now(),
        is_within_dayparting: snapshot.eligibility.within_window,
        brand_budget_status: BudgetSnapshot {
            has_budget_remaining: snapshot.eligibility.has_budget,
            daily_spent: normalize(summary.daily_spend),
            daily_budget: normalize(snapshot.brand.daily_budget),
            daily_remaining: normalize(summary.daily_remaining),
            monthly_spent: normalize(summary.monthly_spend),
            monthly_budget: normalize(snapshot.brand.monthly_budget),
            monthly_remaining: normalize(summary.monthly_remaining),
        },
        dayparting_schedules: snapshot.schedules.iter().map(ScheduleView::from).collect(),
    };

    Ok(Json(DataResponse::new(data)))
}

/// POST /api/campaigns/{id}/toggle/
///
/// `{"action": "activate" | "deactivate"}`. Activation goes through the
/// state machine and is refused with 400 when the campaign cannot run now;
/// deactivation always succeeds.
pub async fn toggle_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let action = parse_toggle_action(&body)?;
    let now = Utc::now();

    let campaign = CampaignRepo::find_active_by_id(&state.pool, campaign_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id: campaign_id,
        }))?;

    let (outcome, verb) = match action {
        ToggleAction::Activate => (
            campaigns::activate(&state.pool, campaign_id, now).await?,
            "activated",
        ),
        ToggleAction::Deactivate => (
            campaigns::deactivate(&state.pool, campaign_id, now).await?,
            "deactivated",
        ),
    };

    if !outcome.applied {
        return Err(AppError::BadRequest(
            "Campaign cannot be activated - check budget and dayparting".to_string(),
        ));
    }

    tracing::info!(campaign_id, status = %outcome.status, "Campaign toggled manually");

    Ok(Json(ToggleResponse {
        success: true,
        message: format!("Campaign {} {verb}", campaign.name),
        new_status: outcome.status,
    }))
}
