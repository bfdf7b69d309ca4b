use axum::routing::post;
use axum::Router;

use crate::handlers::spend;
use crate::state::AppState;

/// Spend intake, merged into `/api` so the trailing slash is kept.
///
/// ```text
/// POST /spend/    -> record_spend
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/spend/", post(spend::record_spend))
}
