//! Budget summary entity model.

use adpace_core::budget::{Remaining, SpendTotals};
use adpace_core::types::{DbId, Money, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `budget_summaries` table: running totals for one
/// (brand, date).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BudgetSummary {
    pub id: DbId,
    pub brand_id: DbId,
    pub date: NaiveDate,
    pub daily_spend: Money,
    pub monthly_spend: Money,
    pub daily_remaining: Money,
    pub monthly_remaining: Money,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BudgetSummary {
    pub fn totals(&self) -> SpendTotals {
        SpendTotals {
            daily_spend: self.daily_spend,
            monthly_spend: self.monthly_spend,
        }
    }

    pub fn remaining(&self) -> Remaining {
        Remaining {
            daily: self.daily_remaining,
            monthly: self.monthly_remaining,
        }
    }
}
