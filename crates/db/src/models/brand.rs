//! Brand entity model and DTOs.

use adpace_core::budget::BudgetLimits;
use adpace_core::dayparting::{local_time, parse_timezone};
use adpace_core::error::CoreError;
use adpace_core::types::{DbId, Money, Timestamp};
use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `brands` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Brand {
    pub id: DbId,
    pub name: String,
    pub daily_budget: Money,
    pub monthly_budget: Money,
    /// IANA zone id, e.g. `Asia/Karachi`.
    pub timezone: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Brand {
    pub fn limits(&self) -> BudgetLimits {
        BudgetLimits {
            daily: self.daily_budget,
            monthly: self.monthly_budget,
        }
    }

    pub fn tz(&self) -> Result<Tz, CoreError> {
        parse_timezone(&self.timezone)
    }

    /// `now` converted into the brand's timezone.
    pub fn local_time(&self, now: Timestamp) -> Result<DateTime<Tz>, CoreError> {
        Ok(local_time(now, self.tz()?))
    }
}

/// DTO for creating a new brand.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBrand {
    pub name: String,
    pub daily_budget: Money,
    pub monthly_budget: Money,
    /// Defaults to `UTC` if omitted.
    pub timezone: Option<String>,
    /// Defaults to `true` if omitted.
    pub is_active: Option<bool>,
}
