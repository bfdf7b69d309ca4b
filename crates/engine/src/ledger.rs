//! Budget ledger: append-only spend records plus per-(brand, date) running
//! totals.
//!
//! The summary row for a (brand, date) is the contention point for every
//! spend on that day. It is created and locked before the spend record is
//! inserted, so the month-to-date seed never includes the spend being
//! recorded and concurrent writers serialize on the row lock.

use adpace_core::budget::{has_budget_remaining as budget_available, RecordType};
use adpace_core::money::validate_spend_amount;
use adpace_core::types::{DbId, Money, Timestamp};
use adpace_db::models::budget_summary::BudgetSummary;
use adpace_db::models::spend_record::{CreateSpendRecord, SpendRecord};
use adpace_db::repositories::{BudgetSummaryRepo, SpendRecordRepo};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::error::{EngineError, EngineResult};

/// The spend record just written and the summary as it stands afterwards.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub record: SpendRecord,
    pub summary: BudgetSummary,
}

/// Which spend counter a reset zeroes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Daily,
    Monthly,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Monthly => "monthly",
        }
    }
}

/// `get_or_create_locked` reports a missing brand as `RowNotFound`.
fn brand_missing(brand_id: DbId) -> impl FnOnce(sqlx::Error) -> EngineError {
    move |e| match e {
        sqlx::Error::RowNotFound => EngineError::not_found("Brand", brand_id),
        other => other.into(),
    }
}

/// Append a spend and bump the summary for `(brand_id, at.date)` inside the
/// caller's transaction. The summary row stays locked until that
/// transaction ends.
///
/// The caller is responsible for checking that the brand and campaign are
/// active and related.
pub async fn append_spend(
    conn: &mut PgConnection,
    brand_id: DbId,
    campaign_id: DbId,
    amount: Money,
    at: Timestamp,
) -> EngineResult<LedgerEntry> {
    let amount = validate_spend_amount(amount)?;
    let date = at.date_naive();

    let summary = BudgetSummaryRepo::get_or_create_locked(conn, brand_id, date)
        .await
        .map_err(brand_missing(brand_id))?;

    let record = SpendRecordRepo::insert(
        &mut *conn,
        &CreateSpendRecord {
            brand_id,
            campaign_id,
            amount,
            spend_datetime: at,
            record_type: RecordType::Daily,
        },
    )
    .await?;

    let summary = BudgetSummaryRepo::add_spend(&mut *conn, summary.id, amount).await?;

    tracing::debug!(
        brand_id,
        campaign_id,
        %amount,
        %date,
        daily_spend = %summary.daily_spend,
        daily_remaining = %summary.daily_remaining,
        "Ledger updated"
    );

    Ok(LedgerEntry { record, summary })
}

/// [`append_spend`] in its own transaction.
pub async fn record_spend(
    pool: &PgPool,
    brand_id: DbId,
    campaign_id: DbId,
    amount: Money,
    at: Timestamp,
) -> EngineResult<LedgerEntry> {
    let mut tx = pool.begin().await?;
    let entry = append_spend(&mut tx, brand_id, campaign_id, amount, at).await?;
    tx.commit().await?;
    Ok(entry)
}

/// Fetch or lazily create the summary for `(brand_id, date)`.
pub async fn get_or_create_summary(
    pool: &PgPool,
    brand_id: DbId,
    date: NaiveDate,
) -> EngineResult<BudgetSummary> {
    let mut tx = pool.begin().await?;
    let summary = BudgetSummaryRepo::get_or_create_locked(&mut tx, brand_id, date)
        .await
        .map_err(brand_missing(brand_id))?;
    tx.commit().await?;
    Ok(summary)
}

/// True when no summary exists for `date` yet, or both remaining budgets
/// are strictly positive.
pub async fn has_budget_remaining<'e, E>(
    executor: E,
    brand_id: DbId,
    date: NaiveDate,
) -> EngineResult<bool>
where
    E: PgExecutor<'e>,
{
    let summary = BudgetSummaryRepo::find(executor, brand_id, date).await?;
    Ok(budget_available(summary.map(|s| s.remaining())))
}

/// Zero one spend counter of the `(brand_id, date)` summary if it is
/// positive. Returns the summary and whether it was changed.
pub async fn reset(
    pool: &PgPool,
    brand_id: DbId,
    date: NaiveDate,
    period: Period,
) -> EngineResult<(BudgetSummary, bool)> {
    let mut tx = pool.begin().await?;
    let summary = BudgetSummaryRepo::get_or_create_locked(&mut tx, brand_id, date)
        .await
        .map_err(brand_missing(brand_id))?;

    let spent = match period {
        Period::Daily => summary.daily_spend,
        Period::Monthly => summary.monthly_spend,
    };
    if spent.is_zero() {
        tx.commit().await?;
        return Ok((summary, false));
    }

    let summary = match period {
        Period::Daily => BudgetSummaryRepo::reset_daily(&mut *tx, summary.id).await?,
        Period::Monthly => BudgetSummaryRepo::reset_monthly(&mut *tx, summary.id).await?,
    };
    tx.commit().await?;

    tracing::info!(brand_id, %date, period = period.as_str(), %spent, "Budget reset");
    Ok((summary, true))
}

/// Delete spend records dated before `cutoff`. Summaries are kept.
pub async fn purge_older_than(pool: &PgPool, cutoff: NaiveDate) -> EngineResult<u64> {
    Ok(SpendRecordRepo::delete_older_than(pool, cutoff).await?)
}
