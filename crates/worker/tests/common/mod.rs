//! Fixtures for worker integration tests.

#![allow(dead_code)]

use std::time::Duration;

use adpace_core::types::{DbId, Money};
use adpace_db::models::brand::{Brand, CreateBrand};
use adpace_db::models::campaign::{Campaign, CreateCampaign};
use adpace_db::models::dayparting_schedule::CreateDaypartingSchedule;
use adpace_db::repositories::{BrandRepo, CampaignRepo, DaypartingScheduleRepo};
use adpace_worker::config::WorkerConfig;
use sqlx::PgPool;

pub fn test_config() -> WorkerConfig {
    WorkerConfig {
        database_url: String::new(),
        poll_interval: Duration::from_millis(10),
        concurrency: 1,
        scheduler_tick: Duration::from_secs(1),
        retention_days: 90,
        spend_max_attempts: 5,
        sweep_max_attempts: 3,
    }
}

pub async fn brand(pool: &PgPool, name: &str, daily: Money, monthly: Money) -> Brand {
    BrandRepo::create(
        pool,
        &CreateBrand {
            name: name.to_string(),
            daily_budget: daily,
            monthly_budget: monthly,
            timezone: None,
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

pub async fn always_open(pool: &PgPool, campaign_id: DbId) {
    for day in 0..=6 {
        DaypartingScheduleRepo::create(
            pool,
            &CreateDaypartingSchedule {
                campaign_id,
                day_of_week: day,
                start_hour: 0,
                end_hour: 23,
                is_active: None,
            },
        )
        .await
        .unwrap();
    }
}
