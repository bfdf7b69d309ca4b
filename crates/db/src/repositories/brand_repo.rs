//! Repository for the `brands` table.

use adpace_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::brand::{Brand, CreateBrand};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, daily_budget, monthly_budget, timezone, is_active, \
                       created_at, updated_at";

/// Provides CRUD operations for brands.
pub struct BrandRepo;

impl BrandRepo {
    /// Insert a new brand, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateBrand) -> Result<Brand, sqlx::Error> {
        let query = format!(
            "INSERT INTO brands (name, daily_budget, monthly_budget, timezone, is_active)
             VALUES ($1, $2, $3, COALESCE($4, 'UTC'), COALESCE($5, TRUE))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Brand>(&query)
            .bind(&input.name)
            .bind(input.daily_budget)
            .bind(input.monthly_budget)
            .bind(&input.timezone)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Brand>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM brands WHERE id = $1");
        sqlx::query_as::<_, Brand>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a brand by ID only if its `is_active` flag is set.
    pub async fn find_active_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Brand>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM brands WHERE id = $1 AND is_active");
        sqlx::query_as::<_, Brand>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find an active brand by its unique name.
    pub async fn find_active_by_name(
        pool: &PgPool,
        name: &str,
    ) -> Result<Option<Brand>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM brands WHERE name = $1 AND is_active");
        sqlx::query_as::<_, Brand>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// List active brands ordered by ID.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Brand>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM brands WHERE is_active ORDER BY id");
        sqlx::query_as::<_, Brand>(&query).fetch_all(pool).await
    }

    /// Flip the brand's `is_active` flag. Returns `true` if a row was updated.
    pub async fn set_active(pool: &PgPool, id: DbId, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE brands SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
