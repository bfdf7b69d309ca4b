//! Repository for the append-only `spend_records` table.

use adpace_core::types::{DbId, Money};
use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};

use crate::models::spend_record::{CreateSpendRecord, SpendRecord};

const COLUMNS: &str = "id, brand_id, campaign_id, amount, spend_date, spend_datetime, \
                       record_type, created_at, updated_at";

/// Insert, aggregate and purge spend records. There is no update path.
pub struct SpendRecordRepo;

impl SpendRecordRepo {
    pub async fn insert<'e, E>(
        executor: E,
        input: &CreateSpendRecord,
    ) -> Result<SpendRecord, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO spend_records (brand_id, campaign_id, amount, spend_date, spend_datetime, record_type)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SpendRecord>(&query)
            .bind(input.brand_id)
            .bind(input.campaign_id)
            .bind(input.amount)
            .bind(input.spend_date())
            .bind(input.spend_datetime)
            .bind(input.record_type.as_str())
            .fetch_one(executor)
            .await
    }

    /// Sum of a brand's spend with `spend_date` in `from..=to`.
    pub async fn sum_for_range<'e, E>(
        executor: E,
        brand_id: DbId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Money, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM spend_records \
             WHERE brand_id = $1 AND spend_date BETWEEN $2 AND $3",
        )
        .bind(brand_id)
        .bind(from)
        .bind(to)
        .fetch_one(executor)
        .await
    }

    /// Number of spend records for a brand.
    pub async fn count_for_brand(pool: &PgPool, brand_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM spend_records WHERE brand_id = $1")
            .bind(brand_id)
            .fetch_one(pool)
            .await
    }

    /// Delete records with `spend_date < cutoff`. Returns the number removed.
    pub async fn delete_older_than(pool: &PgPool, cutoff: NaiveDate) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM spend_records WHERE spend_date < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
