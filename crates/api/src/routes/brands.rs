use axum::routing::get;
use axum::Router;

use crate::handlers::brands;
use crate::state::AppState;

/// Brand routes mounted at `/brands`.
///
/// ```text
/// GET /{id}/status/    -> brand_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/status/", get(brands::brand_status))
}
