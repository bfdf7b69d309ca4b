use adpace_core::error::CoreError;
use adpace_core::money::{normalize, utilization_percent};
use adpace_core::types::{DbId, Money};
use adpace_db::models::campaign::CampaignCounts;
use adpace_db::repositories::{BrandRepo, CampaignRepo};
use adpace_engine::ledger;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BrandStatusData {
    pub brand_id: DbId,
    pub brand_name: String,
    pub timezone: String,
    pub budget_status: BrandBudgetStatus,
    pub campaign_counts: CampaignCounts,
    /// Brand-local wall clock, ISO-8601 with offset.
    pub local_time: String,
}

#[derive(Debug, Serialize)]
pub struct BrandBudgetStatus {
    pub daily_spent: Money,
    pub daily_budget: Money,
    pub daily_remaining: Money,
    pub daily_utilization_percent: Decimal,
    pub monthly_spent: Money,
    pub monthly_budget: Money,
    pub monthly_remaining: Money,
    pub monthly_utilization_percent: Decimal,
    pub has_budget_remaining: bool,
}

/// GET /api/brands/{id}/status/
///
/// Today's spend and utilization for an active brand, plus status counts
/// over its enabled campaigns.
pub async fn brand_status(
    State(state): State<AppState>,
    Path(brand_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let brand = BrandRepo::find_active_by_id(&state.pool, brand_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Brand",
            id: brand_id,
        }))?;

    let summary = ledger::get_or_create_summary(&state.pool, brand.id, now.date_naive()).await?;
    let campaign_counts = CampaignRepo::count_by_status(&state.pool, brand.id).await?;
    let local_time = brand.local_time(now)?.to_rfc3339();

    let budget_status = BrandBudgetStatus {
        daily_spent: normalize(summary.daily_spend),
        daily_budget: normalize(brand.daily_budget),
        daily_remaining: normalize(summary.daily_remaining),
        daily_utilization_percent: utilization_percent(summary.daily_spend, brand.daily_budget),
        monthly_spent: normalize(summary.monthly_spend),
        monthly_budget: normalize(brand.monthly_budget),
        monthly_remaining: normalize(summary.monthly_remaining),
        monthly_utilization_percent: utilization_percent(
            summary.monthly_spend,
            brand.monthly_budget,
        ),
        has_budget_remaining: summary.remaining().has_budget(),
    };

    Ok(Json(DataResponse::new(BrandStatusData {
        brand_id: brand.id,
        brand_name: brand.name,
        timezone: brand.timezone,
        budget_status,
        campaign_counts,
        local_time,
    })))
}
