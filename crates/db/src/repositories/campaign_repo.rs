//! Repository for the `campaigns` table.
//!
//! Status writes go through [`CampaignRepo::set_status`] only, called by the
//! campaign state machine service after it has locked the row.

use adpace_core::campaign_status::CampaignStatus;
use adpace_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::campaign::{Campaign, CampaignCounts, CreateCampaign};
use crate::models::status::StatusId;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, brand_id, name, status_id, is_active, created_at, updated_at";

/// Provides CRUD and locking operations for campaigns.
pub struct CampaignRepo;

impl CampaignRepo {
    /// Insert a new campaign, returning the created row.
    ///
    /// If `status_id` is `None` in the input, defaults to 4 (Inactive).
    pub async fn create(pool: &PgPool, input: &CreateCampaign) -> Result<Campaign, sqlx::Error> {
        let query = format!(
            "INSERT INTO campaigns (brand_id, name, status_id, is_active)
             VALUES ($1, $2, COALESCE($3, $4), COALESCE($5, TRUE))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(input.brand_id)
            .bind(&input.name)
            .bind(input.status_id)
            .bind(CampaignStatus::Inactive.id())
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Campaign>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a campaign by ID only if its manual switch is on.
    pub async fn find_active_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Campaign>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1 AND is_active");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lock an enabled campaign that belongs to the given brand for the rest
    /// of the caller's transaction.
    pub async fn lock_active_in_brand(
        conn: &mut PgConnection,
        brand_id: DbId,
        campaign_id: DbId,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaigns \
             WHERE id = $1 AND brand_id = $2 AND is_active FOR UPDATE"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(campaign_id)
            .bind(brand_id)
            .fetch_optional(conn)
            .await
    }

    /// Find an enabled campaign by its name within a brand.
    pub async fn find_active_by_name(
        pool: &PgPool,
        brand_id: DbId,
        name: &str,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaigns WHERE brand_id = $1 AND name = $2 AND is_active"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(brand_id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Lock a campaign row for the rest of the caller's transaction.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Write a new status. `updated_at` is touched by the table trigger.
    pub async fn set_status<'e, E>(
        executor: E,
        id: DbId,
        status: CampaignStatus,
    ) -> Result<Option<Campaign>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("UPDATE campaigns SET status_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(status.id())
            .fetch_optional(executor)
            .await
    }

    /// Flip the manual switch. Returns `true` if a row was updated.
    pub async fn set_active(pool: &PgPool, id: DbId, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE campaigns SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// IDs of every enabled campaign, ascending.
    pub async fn list_active_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM campaigns WHERE is_active ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// IDs of enabled campaigns whose status is one of `statuses`.
    pub async fn list_active_ids_with_status(
        pool: &PgPool,
        statuses: &[CampaignStatus],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let ids: Vec<StatusId> = statuses.iter().map(|s| s.id()).collect();
        sqlx::query_scalar(
            "SELECT id FROM campaigns WHERE is_active AND status_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// IDs of a brand's enabled campaigns currently in `status`.
    pub async fn list_active_ids_for_brand(
        pool: &PgPool,
        brand_id: DbId,
        status: CampaignStatus,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM campaigns \
             WHERE brand_id = $1 AND is_active AND status_id = $2 \
             ORDER BY id",
        )
        .bind(brand_id)
        .bind(status.id())
        .fetch_all(pool)
        .await
    }

    /// Count a brand's enabled campaigns per status.
    pub async fn count_by_status(
        pool: &PgPool,
        brand_id: DbId,
    ) -> Result<CampaignCounts, sqlx::Error> {
        let rows: Vec<(StatusId, i64)> = sqlx::query_as(
            "SELECT status_id, COUNT(*) FROM campaigns \
             WHERE brand_id = $1 AND is_active \
             GROUP BY status_id",
        )
        .bind(brand_id)
        .fetch_all(pool)
        .await?;

        let mut counts = CampaignCounts::default();
        for (status_id, count) in rows {
            counts.total += count;
            match CampaignStatus::from_id(status_id) {
                Some(CampaignStatus::Active) => counts.active += count,
                Some(CampaignStatus::PausedBudget) => counts.paused_budget += count,
                Some(CampaignStatus::PausedDaypart) => counts.paused_daypart += count,
                Some(CampaignStatus::Inactive) => counts.inactive += count,
                None => {
                    tracing::warn!(brand_id, status_id, "Campaign with unknown status_id");
                }
            }
        }
        Ok(counts)
    }
}
