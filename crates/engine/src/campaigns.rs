//! Campaign state machine service.
//!
//! Wraps the pure rules in `adpace_core::campaign_status` with the database
//! work: lock the campaign row, gather its eligibility (manual switch,
//! brand budget for today, dayparting window in brand-local time), resolve
//! the transition and persist the result. Only the four named transitions
//! write `status_id`.

use adpace_core::campaign_status::{apply, CampaignStatus, Eligibility, Transition};
use adpace_core::dayparting::{is_within_window, ScheduleWindow};
use adpace_core::types::{DbId, Timestamp};
use adpace_db::models::brand::Brand;
use adpace_db::models::campaign::Campaign;
use adpace_db::models::dayparting_schedule::DaypartingSchedule;
use adpace_db::repositories::{BrandRepo, CampaignRepo, DaypartingScheduleRepo};
use sqlx::{PgConnection, PgPool};

use crate::error::{EngineError, EngineResult};
use crate::ledger;

/// A campaign row plus everything needed to judge it at one instant.
#[derive(Debug, Clone)]
pub struct CampaignSnapshot {
    pub campaign: Campaign,
    pub status: CampaignStatus,
    pub brand: Brand,
    pub schedules: Vec<DaypartingSchedule>,
    pub eligibility: Eligibility,
}

impl CampaignSnapshot {
    pub fn can_run_now(&self) -> bool {
        self.eligibility.can_run()
    }
}

/// Result of one transition attempt.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub campaign_id: DbId,
    pub transition: Transition,
    pub previous: CampaignStatus,
    pub status: CampaignStatus,
    /// A status write happened (an activation refused by `can_run` writes
    /// nothing).
    pub applied: bool,
}

impl TransitionOutcome {
    pub fn changed(&self) -> bool {
        self.previous != self.status
    }
}

/// Gather the snapshot for an already loaded campaign.
///
/// Runs on the caller's connection so it sees the caller's transaction.
pub async fn snapshot(
    conn: &mut PgConnection,
    campaign: Campaign,
    now: Timestamp,
) -> EngineResult<CampaignSnapshot> {
    let status = campaign.status()?;
    let brand = BrandRepo::find_by_id(&mut *conn, campaign.brand_id)
        .await?
        .ok_or_else(|| EngineError::not_found("Brand", campaign.brand_id))?;
    let schedules =
        DaypartingScheduleRepo::list_active_for_campaign(&mut *conn, campaign.id).await?;
    let has_budget =
        ledger::has_budget_remaining(&mut *conn, brand.id, now.date_naive()).await?;

    let windows: Vec<ScheduleWindow> = schedules.iter().map(DaypartingSchedule::window).collect();
    let within_window = is_within_window(&windows, &brand.local_time(now)?);

    let eligibility = Eligibility {
        is_active: campaign.is_active,
        has_budget,
        within_window,
    };

    Ok(CampaignSnapshot {
        campaign,
        status,
        brand,
        schedules,
        eligibility,
    })
}

/// Lock the campaign row `FOR UPDATE` and build its snapshot.
pub async fn lock(
    conn: &mut PgConnection,
    campaign_id: DbId,
    now: Timestamp,
) -> EngineResult<CampaignSnapshot> {
    let campaign = CampaignRepo::lock_for_update(conn, campaign_id)
        .await?
        .ok_or_else(|| EngineError::not_found("Campaign", campaign_id))?;
    snapshot(conn, campaign, now).await
}

/// Load a campaign and its snapshot without locking. Read-only callers
/// (status endpoints, `can_run_now`) use this.
pub async fn load(pool: &PgPool, campaign_id: DbId, now: Timestamp) -> EngineResult<CampaignSnapshot> {
    let mut conn = pool.acquire().await?;
    let campaign = CampaignRepo::find_by_id(&mut *conn, campaign_id)
        .await?
        .ok_or_else(|| EngineError::not_found("Campaign", campaign_id))?;
    snapshot(&mut conn, campaign, now).await
}

/// `is_active AND budget remaining today AND within a dayparting window`.
pub async fn can_run_now(pool: &PgPool, campaign_id: DbId, now: Timestamp) -> EngineResult<bool> {
    Ok(load(pool, campaign_id, now).await?.can_run_now())
}

/// Resolve `transition` against a locked snapshot and persist the result.
pub async fn apply_locked(
    conn: &mut PgConnection,
    locked: &CampaignSnapshot,
    transition: Transition,
) -> EngineResult<TransitionOutcome> {
    let campaign_id = locked.campaign.id;
    let previous = locked.status;

    let Some(target) = apply(transition, locked.eligibility) else {
        tracing::debug!(
            campaign_id,
            transition = transition.name(),
            eligibility = ?locked.eligibility,
            "Activation skipped: campaign cannot run now"
        );
        return Ok(TransitionOutcome {
            campaign_id,
            transition,
            previous,
            status: previous,
            applied: false,
        });
    };

    CampaignRepo::set_status(conn, campaign_id, target)
        .await?
        .ok_or_else(|| EngineError::not_found("Campaign", campaign_id))?;

    if previous != target {
        tracing::info!(
            campaign_id,
            brand_id = locked.campaign.brand_id,
            transition = transition.name(),
            from = %previous,
            to = %target,
            "Campaign status changed"
        );
    }

    Ok(TransitionOutcome {
        campaign_id,
        transition,
        previous,
        status: target,
        applied: true,
    })
}

/// Lock, judge and transition one campaign in its own transaction.
pub async fn transition(
    pool: &PgPool,
    campaign_id: DbId,
    transition: Transition,
    now: Timestamp,
) -> EngineResult<TransitionOutcome> {
    let mut tx = pool.begin().await?;
    let locked = lock(&mut tx, campaign_id, now).await?;
    let outcome = apply_locked(&mut tx, &locked, transition).await?;
    tx.commit().await?;
    Ok(outcome)
}

pub async fn pause_for_budget(
    pool: &PgPool,
    campaign_id: DbId,
    now: Timestamp,
) -> EngineResult<TransitionOutcome> {
    transition(pool, campaign_id, Transition::PauseForBudget, now).await
}

pub async fn pause_for_daypart(
    pool: &PgPool,
    campaign_id: DbId,
    now: Timestamp,
) -> EngineResult<TransitionOutcome> {
    transition(pool, campaign_id, Transition::PauseForDaypart, now).await
}

/// Self-checking: a no-op (not an error) when the campaign cannot run now.
pub async fn activate(
    pool: &PgPool,
    campaign_id: DbId,
    now: Timestamp,
) -> EngineResult<TransitionOutcome> {
    transition(pool, campaign_id, Transition::Activate, now).await
}

/// Manual deactivation; the only unconditional write of `INACTIVE`.
pub async fn deactivate(
    pool: &PgPool,
    campaign_id: DbId,
    now: Timestamp,
) -> EngineResult<TransitionOutcome> {
    transition(pool, campaign_id, Transition::Deactivate, now).await
}
