//! Reconciliation sweeps.
//!
//! Each sweep walks an entity set and applies the decision tables from
//! `adpace_core::campaign_status`. Every entity is handled in its own
//! transaction; an error on one entity is logged, counted in the
//! [`SweepReport`] and the loop moves on. A sweep stops between entities
//! when its cancellation token fires; the next scheduled run picks up
//! whatever was left.
//!
//! Only listing the entity set can fail the sweep as a whole.

use adpace_core::budget::retention_cutoff;
use adpace_core::campaign_status::{
    budget_decision, dayparting_decision, reset_decision, CampaignStatus, Transition,
};
use adpace_core::schedule::SweepKind;
use adpace_core::types::{DbId, Timestamp};
use adpace_core::work::SweepReport;
use adpace_db::models::brand::Brand;
use adpace_db::repositories::{BrandRepo, CampaignRepo, WorkItemRepo};
use chrono::NaiveTime;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::campaigns::{self, CampaignSnapshot};
use crate::error::EngineResult;
use crate::ledger::{self, Period};

/// Knobs for sweeps that need more than the current instant.
#[derive(Debug, Clone, Copy)]
pub struct SweepOptions {
    pub retention_days: i64,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            retention_days: adpace_core::budget::DEFAULT_RETENTION_DAYS,
        }
    }
}

/// Run the sweep identified by `kind`.
pub async fn run(
    pool: &PgPool,
    kind: SweepKind,
    now: Timestamp,
    options: SweepOptions,
    cancel: &CancellationToken,
) -> EngineResult<SweepReport> {
    match kind {
        SweepKind::Dayparting => dayparting_sweep(pool, now, cancel).await,
        SweepKind::Budget => budget_sweep(pool, now, cancel).await,
        SweepKind::DailyReset => budget_reset(pool, Period::Daily, now, cancel).await,
        SweepKind::MonthlyReset => budget_reset(pool, Period::Monthly, now, cancel).await,
        SweepKind::SpendRetention => purge_spend_records(pool, now, options.retention_days).await,
    }
}

// ---------------------------------------------------------------------------
// Campaign sweeps
// ---------------------------------------------------------------------------

/// Hourly: pause active campaigns outside their window, reactivate
/// daypart-paused campaigns back inside it when budget allows.
pub async fn dayparting_sweep(
    pool: &PgPool,
    now: Timestamp,
    cancel: &CancellationToken,
) -> EngineResult<SweepReport> {
    let ids = CampaignRepo::list_active_ids(pool).await?;
    let decide = |s: &CampaignSnapshot| {
        dayparting_decision(s.status, s.eligibility.within_window, s.eligibility.has_budget)
    };
    let report = sweep_campaigns(pool, SweepKind::Dayparting, &ids, now, cancel, decide).await;
    Ok(log_report(report))
}

/// Every five minutes: pause active campaigns whose brand ran out of budget,
/// reactivate budget-paused campaigns that have budget and are in window.
pub async fn budget_sweep(
    pool: &PgPool,
    now: Timestamp,
    cancel: &CancellationToken,
) -> EngineResult<SweepReport> {
    let ids = CampaignRepo::list_active_ids_with_status(
        pool,
        &[CampaignStatus::Active, CampaignStatus::PausedBudget],
    )
    .await?;
    let decide = |s: &CampaignSnapshot| {
        budget_decision(s.status, s.eligibility.has_budget, s.eligibility.within_window)
    };
    let report = sweep_campaigns(pool, SweepKind::Budget, &ids, now, cancel, decide).await;
    Ok(log_report(report))
}

async fn sweep_campaigns<F>(
    pool: &PgPool,
    kind: SweepKind,
    ids: &[DbId],
    now: Timestamp,
    cancel: &CancellationToken,
    decide: F,
) -> SweepReport
where
    F: Fn(&CampaignSnapshot) -> Option<Transition>,
{
    let mut report = SweepReport::new(kind);
    for &campaign_id in ids {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        report.examined += 1;
        match reconcile_campaign(pool, campaign_id, now, &decide).await {
            Ok(true) => report.mutated += 1,
            Ok(false) => {}
            Err(e) => {
                report.failed += 1;
                tracing::error!(sweep = %kind, campaign_id, error = %e, "Campaign reconcile failed");
            }
        }
    }
    report
}

/// Re-evaluate one campaign under its row lock. Returns whether its status
/// changed.
async fn reconcile_campaign<F>(
    pool: &PgPool,
    campaign_id: DbId,
    now: Timestamp,
    decide: &F,
) -> EngineResult<bool>
where
    F: Fn(&CampaignSnapshot) -> Option<Transition>,
{
    let mut tx = pool.begin().await?;
    let locked = campaigns::lock(&mut tx, campaign_id, now).await?;

    // The manual switch may have been turned off since the id was listed.
    if !locked.campaign.is_active {
        return Ok(false);
    }

    let changed = match decide(&locked) {
        Some(transition) => campaigns::apply_locked(&mut tx, &locked, transition)
            .await?
            .changed(),
        None => false,
    };
    tx.commit().await?;
    Ok(changed)
}

// ---------------------------------------------------------------------------
// Budget resets
// ---------------------------------------------------------------------------

/// Daily (00:00 UTC) or monthly (00:00 UTC on day 1) reset.
///
/// For every active brand: zero the period's counter on today's summary if
/// it is positive, then try to activate each budget-paused campaign of the
/// brand. Activation is self-checking, so only campaigns that can run now
/// flip. `examined` counts brands plus the campaigns tried; `mutated`
/// counts summaries reset plus campaigns activated.
pub async fn budget_reset(
    pool: &PgPool,
    period: Period,
    now: Timestamp,
    cancel: &CancellationToken,
) -> EngineResult<SweepReport> {
    let kind = match period {
        Period::Daily => SweepKind::DailyReset,
        Period::Monthly => SweepKind::MonthlyReset,
    };
    let brands = BrandRepo::list_active(pool).await?;
    let mut report = SweepReport::new(kind);

    for brand in &brands {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        report.examined += 1;
        match ledger::reset(pool, brand.id, now.date_naive(), period).await {
            Ok((_, true)) => report.mutated += 1,
            Ok((_, false)) => {}
            Err(e) => {
                report.failed += 1;
                tracing::error!(sweep = %kind, brand_id = brand.id, error = %e, "Budget reset failed");
                continue;
            }
        }
        if let Err(e) = reactivate_budget_paused(pool, brand, now, cancel, &mut report).await {
            report.failed += 1;
            tracing::error!(
                sweep = %kind,
                brand_id = brand.id,
                error = %e,
                "Listing budget-paused campaigns failed"
            );
        }
    }

    Ok(log_report(report))
}

async fn reactivate_budget_paused(
    pool: &PgPool,
    brand: &Brand,
    now: Timestamp,
    cancel: &CancellationToken,
    report: &mut SweepReport,
) -> EngineResult<()> {
    let ids =
        CampaignRepo::list_active_ids_for_brand(pool, brand.id, CampaignStatus::PausedBudget)
            .await?;
    let decide = |s: &CampaignSnapshot| reset_decision(s.status);

    for campaign_id in ids {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        report.examined += 1;
        match reconcile_campaign(pool, campaign_id, now, &decide).await {
            Ok(true) => report.mutated += 1,
            Ok(false) => {}
            Err(e) => {
                report.failed += 1;
                tracing::error!(
                    sweep = %report.sweep,
                    brand_id = brand.id,
                    campaign_id,
                    error = %e,
                    "Reactivation after reset failed"
                );
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Retention
// ---------------------------------------------------------------------------

/// Delete spend records older than `days_to_keep` days. Summaries are kept.
///
/// Finished work items past the same cutoff go too.
pub async fn purge_spend_records(
    pool: &PgPool,
    now: Timestamp,
    days_to_keep: i64,
) -> EngineResult<SweepReport> {
    let cutoff = retention_cutoff(now.date_naive(), days_to_keep);
    let records = ledger::purge_older_than(pool, cutoff).await?;

    let finished_before = cutoff.and_time(NaiveTime::MIN).and_utc();
    let work_items = WorkItemRepo::purge_finished_before(pool, finished_before).await?;

    let mut report = SweepReport::new(SweepKind::SpendRetention);
    report.examined = records + work_items;
    report.mutated = records + work_items;
    tracing::info!(%cutoff, records, work_items, "Old spend records purged");
    Ok(report)
}

fn log_report(report: SweepReport) -> SweepReport {
    if report.failed > 0 {
        tracing::warn!(
            sweep = %report.sweep,
            examined = report.examined,
            mutated = report.mutated,
            failed = report.failed,
            cancelled = report.cancelled,
            "Sweep finished with errors"
        );
    } else {
        tracing::info!(
            sweep = %report.sweep,
            examined = report.examined,
            mutated = report.mutated,
            cancelled = report.cancelled,
            "Sweep finished"
        );
    }
    report
}
