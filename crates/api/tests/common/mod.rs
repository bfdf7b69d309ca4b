#![allow(dead_code)]

use std::sync::Arc;

use adpace_api::config::ServerConfig;
use adpace_api::router::build_app_router;
use adpace_api::state::AppState;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        max_body_bytes: 16 * 1024,
    }
}

/// Build the application router exactly as `main.rs` does.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

use adpace_core::types::{DbId, Money};
use adpace_db::models::brand::{Brand, CreateBrand};
use adpace_db::models::campaign::{Campaign, CreateCampaign};
use adpace_db::models::dayparting_schedule::CreateDaypartingSchedule;
use adpace_db::repositories::{BrandRepo, CampaignRepo, DaypartingScheduleRepo};

pub async fn brand(pool: &PgPool, name: &str, daily: Money, monthly: Money) -> Brand {
    BrandRepo::create(
        pool,
        &CreateBrand {
            name: name.to_string(),
            daily_budget: daily,
            monthly_budget: monthly,
            timezone: Some("Asia/Karachi".to_string()),
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

/// Allow the campaign to run at any hour of any day.
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
