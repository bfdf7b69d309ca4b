pub mod brands;
pub mod campaigns;
pub mod health;
pub mod spend;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /spend/                         record a spend (POST, queued)
/// /campaigns/{id}/status/         campaign status and budget snapshot (GET)
/// /campaigns/{id}/toggle/         manual activate / deactivate (POST)
/// /brands/{id}/status/            brand utilization and campaign counts (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(spend::router())
        .nest("/campaigns", campaigns::router())
        .nest("/brands", brands::router())
}
