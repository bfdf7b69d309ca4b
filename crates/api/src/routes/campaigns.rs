use axum::routing::{get, post};
use axum::Router;

use crate::handlers::campaigns;
use crate::state::AppState;

/// Campaign routes mounted at `/campaigns`.
///
/// ```text
/// GET  /{id}/status/    -> campaign_status
/// POST /{id}/toggle/    -> toggle_campaign
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/status/", get(campaigns::campaign_status))
        .route("/{id}/toggle/", post(campaigns::toggle_campaign))
}
