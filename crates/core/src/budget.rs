//! Budget arithmetic shared by the ledger and the status endpoints.
//!
//! Pure logic. The persistent counters live in `budget_summaries`; this
//! module only defines how remaining budget is derived from spend and what
//! "budget available" means.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Spend records older than this many days are purged by the retention job.
pub const DEFAULT_RETENTION_DAYS: i64 = 90;

/// Per-brand budget limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetLimits {
    pub daily: Money,
    pub monthly: Money,
}

/// Running spend totals for one (brand, date).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpendTotals {
    pub daily_spend: Money,
    pub monthly_spend: Money,
}

/// Budget left after subtracting spend from the limits. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Remaining {
    pub daily: Money,
    pub monthly: Money,
}

impl BudgetLimits {
    pub fn remaining(&self, totals: &SpendTotals) -> Remaining {
        Remaining {
            daily: self.daily - totals.daily_spend,
            monthly: self.monthly - totals.monthly_spend,
        }
    }
}

impl SpendTotals {
    /// Add `amount` to both counters.
    pub fn add(self, amount: Money) -> Self {
        Self {
            daily_spend: self.daily_spend + amount,
            monthly_spend: self.monthly_spend + amount,
        }
    }
}

impl Remaining {
    /// Both daily and monthly budget are strictly positive.
    pub fn has_budget(&self) -> bool {
        self.daily > Decimal::ZERO && self.monthly > Decimal::ZERO
    }

    pub fn is_exhausted(&self) -> bool {
        !self.has_budget()
    }
}

/// Budget check for a date whose summary may not exist yet.
///
/// No summary means nothing has been spent that day, so budget is available.
pub fn has_budget_remaining(remaining: Option<Remaining>) -> bool {
    remaining.map_or(true, |r| r.has_budget())
}

/// First day of `date`'s month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Dates strictly before the returned cutoff are eligible for purging.
pub fn retention_cutoff(today: NaiveDate, days_to_keep: i64) -> NaiveDate {
    today - Duration::days(days_to_keep.max(0))
}

/// Kind of spend record. Recording always writes `Daily`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordType {
    #[default]
    Daily,
    Monthly,
}

impl RecordType {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Daily => "DAILY",
            RecordType::Monthly => "MONTHLY",
        }
    }
}
