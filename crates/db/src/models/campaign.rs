//! Campaign entity model and DTOs.

use adpace_core::campaign_status::CampaignStatus;
use adpace_core::error::CoreError;
use adpace_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::status::StatusId;

/// A row from the `campaigns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Campaign {
    pub id: DbId,
    pub brand_id: DbId,
    pub name: String,
    pub status_id: StatusId,
    /// Manual on/off switch, independent of `status_id`.
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Campaign {
    pub fn status(&self) -> Result<CampaignStatus, CoreError> {
        CampaignStatus::from_id(self.status_id).ok_or_else(|| {
            CoreError::Internal(format!(
                "Campaign {} has unknown status_id {}",
                self.id, self.status_id
            ))
        })
    }
}

/// DTO for creating a new campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaign {
    pub brand_id: DbId,
    pub name: String,
    /// Defaults to 4 (Inactive) if omitted.
    pub status_id: Option<StatusId>,
    /// Defaults to `true` if omitted.
    pub is_active: Option<bool>,
}

/// Campaign counts for one brand, grouped by status.
///
/// Only campaigns with the manual switch on are counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CampaignCounts {
    pub total: i64,
    pub active: i64,
    pub paused_budget: i64,
    pub paused_daypart: i64,
    pub inactive: i64,
}
