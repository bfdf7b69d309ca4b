//! Spend record entity model and DTOs.

use adpace_core::budget::RecordType;
use adpace_core::types::{DbId, Money, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `spend_records` table. Never updated after insert.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SpendRecord {
    pub id: DbId,
    pub brand_id: DbId,
    pub campaign_id: DbId,
    pub amount: Money,
    pub spend_date: NaiveDate,
    pub spend_datetime: Timestamp,
    pub record_type: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for appending a spend record.
#[derive(Debug, Clone)]
pub struct CreateSpendRecord {
    pub brand_id: DbId,
    pub campaign_id: DbId,
    pub amount: Money,
    pub spend_datetime: Timestamp,
    pub record_type: RecordType,
}

impl CreateSpendRecord {
    /// Ledger date of the spend: the UTC calendar date of `spend_datetime`.
    pub fn spend_date(&self) -> NaiveDate {
        self.spend_datetime.date_naive()
    }
}
