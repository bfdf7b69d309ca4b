//! Spend recording: the entry point invoked once per spend event.
//!
//! One transaction: lock the campaign, append to the ledger (summary row
//! locked until commit), pause the campaign if the budget is now exhausted.
//! A failure anywhere rolls the spend back, so a retried event is counted
//! once. Locks are taken campaign first, then summary, the same order the
//! sweeps use.

use adpace_core::campaign_status::{spend_decision, CampaignStatus};
use adpace_core::money::{normalize, validate_spend_amount};
use adpace_core::types::Timestamp;
use adpace_core::work::{SpendRecorded, SpendRequest};
use adpace_db::repositories::{BrandRepo, CampaignRepo};
use sqlx::PgPool;

use crate::campaigns;
use crate::error::{EngineError, EngineResult};
use crate::ledger;

/// Record one spend and pause the campaign if the brand's budget ran out.
///
/// `now` is used when the request carries no `spend_datetime`, and as the
/// evaluation instant for the campaign transition.
pub async fn record_spend(
    pool: &PgPool,
    request: &SpendRequest,
    now: Timestamp,
) -> EngineResult<SpendRecorded> {
    let amount = validate_spend_amount(request.amount)?;
    let at = request.spend_datetime.unwrap_or(now);
    let (brand_id, campaign_id) = (request.brand_id, request.campaign_id);

    let mut tx = pool.begin().await?;
    BrandRepo::find_active_by_id(&mut *tx, brand_id)
        .await?
        .ok_or_else(|| EngineError::not_found("Brand", brand_id))?;
    let campaign = CampaignRepo::lock_active_in_brand(&mut tx, brand_id, campaign_id)
        .await?
        .ok_or_else(|| EngineError::not_found("Campaign", campaign_id))?;

    let entry = ledger::append_spend(&mut tx, brand_id, campaign.id, amount, at).await?;

    let exhausted = entry.summary.remaining().is_exhausted();
    let current = campaign.status()?;
    let status = match spend_decision(current, exhausted) {
        Some(transition) => {
            let locked = campaigns::snapshot(&mut tx, campaign, now).await?;
            campaigns::apply_locked(&mut tx, &locked, transition).await?.status
        }
        None => current,
    };
    tx.commit().await?;

    tracing::info!(
        brand_id,
        campaign_id,
        %amount,
        spend_record_id = entry.record.id,
        daily_remaining = %entry.summary.daily_remaining,
        monthly_remaining = %entry.summary.monthly_remaining,
        status = %status,
        "Spend recorded"
    );

    Ok(SpendRecorded {
        spend_record_id: entry.record.id,
        daily_remaining: normalize(entry.summary.daily_remaining),
        monthly_remaining: normalize(entry.summary.monthly_remaining),
        campaign_paused: status != CampaignStatus::Active,
    })
}
