//! Repository for the `budget_summaries` table.
//!
//! Every statement that changes a spend column rewrites both remaining
//! columns from the brand's budgets in the same statement, so
//! `remaining + spend == budget` holds after every write.

use adpace_core::budget::month_start;
use adpace_core::types::{DbId, Money};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgExecutor};

use crate::models::budget_summary::BudgetSummary;

const COLUMNS: &str = "id, brand_id, date, daily_spend, monthly_spend, daily_remaining, \
                       monthly_remaining, created_at, updated_at";

/// Same columns qualified with the `s` alias, for `UPDATE ... FROM brands`.
const S_COLUMNS: &str = "s.id, s.brand_id, s.date, s.daily_spend, s.monthly_spend, \
                         s.daily_remaining, s.monthly_remaining, s.created_at, s.updated_at";

/// Provides get-or-create, locking and counter updates for budget summaries.
pub struct BudgetSummaryRepo;

impl BudgetSummaryRepo {
    pub async fn find<'e, E>(
        executor: E,
        brand_id: DbId,
        date: NaiveDate,
    ) -> Result<Option<BudgetSummary>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query =
            format!("SELECT {COLUMNS} FROM budget_summaries WHERE brand_id = $1 AND date = $2");
        sqlx::query_as::<_, BudgetSummary>(&query)
            .bind(brand_id)
            .bind(date)
            .fetch_optional(executor)
            .await
    }

    /// Fetch the summary for `(brand_id, date)`, creating it if absent, and
    /// lock it `FOR UPDATE` until the caller's transaction ends.
    ///
    /// A new row starts with `daily_spend = 0` and `monthly_spend` seeded
    /// from the brand's spend records between the first of `date`'s month
    /// and `date` inclusive. Concurrent callers race on the unique
    /// `(brand_id, date)` key; the loser's insert is a no-op and it then
    /// waits on the row lock.
    ///
    /// Fails with `RowNotFound` when the brand does not exist.
    pub async fn get_or_create_locked(
        conn: &mut PgConnection,
        brand_id: DbId,
        date: NaiveDate,
    ) -> Result<BudgetSummary, sqlx::Error> {
        let inserted = sqlx::query(
            "INSERT INTO budget_summaries \
                 (brand_id, date, daily_spend, monthly_spend, daily_remaining, monthly_remaining) \
             SELECT b.id, $2, 0, m.total, b.daily_budget, b.monthly_budget - m.total \
             FROM brands b \
             CROSS JOIN LATERAL ( \
                 SELECT COALESCE(SUM(r.amount), 0) AS total \
                 FROM spend_records r \
                 WHERE r.brand_id = b.id AND r.spend_date BETWEEN $3 AND $2 \
             ) m \
             WHERE b.id = $1 \
             ON CONFLICT (brand_id, date) DO NOTHING",
        )
        .bind(brand_id)
        .bind(date)
        .bind(month_start(date))
        .execute(&mut *conn)
        .await?;

        if inserted.rows_affected() > 0 {
            tracing::debug!(brand_id, %date, "Created budget summary");
        }

        let query = format!(
            "SELECT {COLUMNS} FROM budget_summaries WHERE brand_id = $1 AND date = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, BudgetSummary>(&query)
            .bind(brand_id)
            .bind(date)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Atomically add `amount` to both spend counters and recompute the
    /// remaining columns.
    pub async fn add_spend<'e, E>(
        executor: E,
        summary_id: DbId,
        amount: Money,
    ) -> Result<BudgetSummary, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE budget_summaries s SET \
                 daily_spend = s.daily_spend + $2, \
                 monthly_spend = s.monthly_spend + $2, \
                 daily_remaining = b.daily_budget - (s.daily_spend + $2), \
                 monthly_remaining = b.monthly_budget - (s.monthly_spend + $2) \
             FROM brands b \
             WHERE s.id = $1 AND b.id = s.brand_id \
             RETURNING {S_COLUMNS}"
        );
        sqlx::query_as::<_, BudgetSummary>(&query)
            .bind(summary_id)
            .bind(amount)
            .fetch_one(executor)
            .await
    }

    /// Zero `daily_spend` and recompute both remaining columns.
    pub async fn reset_daily<'e, E>(
        executor: E,
        summary_id: DbId,
    ) -> Result<BudgetSummary, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE budget_summaries s SET \
                 daily_spend = 0, \
                 daily_remaining = b.daily_budget, \
                 monthly_remaining = b.monthly_budget - s.monthly_spend \
             FROM brands b \
             WHERE s.id = $1 AND b.id = s.brand_id \
             RETURNING {S_COLUMNS}"
        );
        sqlx::query_as::<_, BudgetSummary>(&query)
            .bind(summary_id)
            .fetch_one(executor)
            .await
    }

    /// Zero `monthly_spend` and recompute both remaining columns.
    pub async fn reset_monthly<'e, E>(
        executor: E,
        summary_id: DbId,
    ) -> Result<BudgetSummary, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE budget_summaries s SET \
                 monthly_spend = 0, \
                 daily_remaining = b.daily_budget - s.daily_spend, \
                 monthly_remaining = b.monthly_budget \
             FROM brands b \
             WHERE s.id = $1 AND b.id = s.brand_id \
             RETURNING {S_COLUMNS}"
        );
        sqlx::query_as::<_, BudgetSummary>(&query)
            .bind(summary_id)
            .fetch_one(executor)
            .await
    }
}
