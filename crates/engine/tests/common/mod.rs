//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use adpace_core::campaign_status::CampaignStatus;
use adpace_core::types::{DbId, Money, Timestamp};
use adpace_db::models::brand::{Brand, CreateBrand};
use adpace_db::models::campaign::{Campaign, CreateCampaign};
use adpace_db::models::dayparting_schedule::CreateDaypartingSchedule;
use adpace_db::repositories::{BrandRepo, CampaignRepo, DaypartingScheduleRepo};
use chrono::{TimeZone, Utc};
use sqlx::PgPool;

pub const MONDAY: i16 = 0;
pub const TUESDAY: i16 = 1;

/// UTC instant helper.
pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub async fn brand(pool: &PgPool, name: &str, daily: Money, monthly: Money, tz: &str) -> Brand {
    BrandRepo::create(
        pool,
        &CreateBrand {
            name: name.to_string(),
            daily_budget: daily,
            monthly_budget: monthly,
            timezone: Some(tz.to_string()),
            is_active: None,
        },
    )
    .await
    .unwrap()
}

pub async fn campaign(pool: &PgPool, brand_id: DbId, name: &str) -> Campaign {
    CampaignRepo::create(
        pool,
        &CreateCampaign {
            brand_id,
            name: name.to_string(),
            status_id: None,
            is_active: None,
        },
    )
    .await
    .unwrap()
}

/// A campaign forced into `status`, bypassing the state machine.
pub async fn campaign_with_status(
    pool: &PgPool,
    brand_id: DbId,
    name: &str,
    status: CampaignStatus,
) -> Campaign {
    let c = campaign(pool, brand_id, name).await;
    CampaignRepo::set_status(pool, c.id, status)
        .await
        .unwrap()
        .unwrap()
}

pub async fn window(pool: &PgPool, campaign_id: DbId, day: i16, start: i16, end: i16) {
    DaypartingScheduleRepo::create(
        pool,
        &CreateDaypartingSchedule {
            campaign_id,
            day_of_week: day,
            start_hour: start,
            end_hour: end,
            is_active: None,
        },
    )
    .await
    .unwrap();
}

/// Open every day of the week for the whole day.
pub async fn always_open(pool: &PgPool, campaign_id: DbId) {
    for day in 0..=6 {
        window(pool, campaign_id, day, 0, 23).await;
    }
}

pub async fn status_of(pool: &PgPool, campaign_id: DbId) -> CampaignStatus {
    CampaignRepo::find_by_id(pool, campaign_id)
        .await
        .unwrap()
        .unwrap()
        .status()
        .unwrap()
}
