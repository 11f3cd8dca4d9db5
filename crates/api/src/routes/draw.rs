//! Route definitions for programmatic model generation.

use axum::routing::post;
use axum::Router;

use crate::handlers::draw;
use crate::state::AppState;

/// Routes mounted at `/draw`.
///
/// ```text
/// POST /session    -> session
/// POST /line       -> line
/// POST /primitive  -> primitive
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", post(draw::session))
        .route("/line", post(draw::line))
        .route("/primitive", post(draw::primitive))
}
