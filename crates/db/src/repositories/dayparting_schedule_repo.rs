//! Repository for the `dayparting_schedules` table.

use adpace_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::dayparting_schedule::{CreateDaypartingSchedule, DaypartingSchedule};

const COLUMNS: &str = "id, campaign_id, day_of_week, start_hour, end_hour, is_active, \
                       created_at, updated_at";

/// Provides CRUD operations for dayparting schedules.
pub struct DaypartingScheduleRepo;

impl DaypartingScheduleRepo {
    /// Insert a schedule row. Range and ordering are enforced by CHECK
    /// constraints.
    pub async fn create(
        pool: &PgPool,
        input: &CreateDaypartingSchedule,
    ) -> Result<DaypartingSchedule, sqlx::Error> {
        let query = format!(
            "INSERT INTO dayparting_schedules (campaign_id, day_of_week, start_hour, end_hour, is_active)
             VALUES ($1, $2, $3, $4, COALESCE($5, TRUE))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DaypartingSchedule>(&query)
            .bind(input.campaign_id)
            .bind(input.day_of_week)
            .bind(input.start_hour)
            .bind(input.end_hour)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Active schedules for a campaign, ordered by day then start hour.
    pub async fn list_active_for_campaign<'e, E>(
        executor: E,
        campaign_id: DbId,
    ) -> Result<Vec<DaypartingSchedule>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM dayparting_schedules \
             WHERE campaign_id = $1 AND is_active \
             ORDER BY day_of_week, start_hour, id"
        );
        sqlx::query_as::<_, DaypartingSchedule>(&query)
            .bind(campaign_id)
            .fetch_all(executor)
            .await
    }

    /// Enable or disable a schedule row. Returns `true` if a row was updated.
    pub async fn set_active(pool: &PgPool, id: DbId, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE dayparting_schedules SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
