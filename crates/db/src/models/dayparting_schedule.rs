//! Dayparting schedule entity model and DTOs.

use adpace_core::dayparting::ScheduleWindow;
use adpace_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `dayparting_schedules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DaypartingSchedule {
    pub id: DbId,
    pub campaign_id: DbId,
    /// 0 = Monday .. 6 = Sunday.
    pub day_of_week: i16,
    pub start_hour: i16,
    pub end_hour: i16,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DaypartingSchedule {
    pub fn window(&self) -> ScheduleWindow {
        ScheduleWindow {
            day_of_week: self.day_of_week,
            start_hour: self.start_hour,
            end_hour: self.end_hour,
            is_active: self.is_active,
        }
    }
}

/// DTO for creating a new schedule row.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDaypartingSchedule {
    pub campaign_id: DbId,
    pub day_of_week: i16,
    pub start_hour: i16,
    pub end_hour: i16,
    /// Defaults to `true` if omitted.
    pub is_active: Option<bool>,
}
