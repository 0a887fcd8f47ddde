//! Route definitions for the `/jenkins` relay.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{builds, relay};
use crate::state::AppState;

/// Routes mounted at `/jenkins`.
///
/// ```text
/// GET    /proxy     -> proxy_progressive_log
/// POST   /build     -> trigger_build
/// GET    /queue     -> queue_status
/// GET    /status    -> build_status
/// POST   /stop      -> stop_build
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/proxy", get(relay::proxy_progressive_log))
        .route("/build", post(builds::trigger_build))
        .route("/queue", get(builds::queue_status))
        .route("/status", get(builds::build_status))
        .route("/stop", post(builds::stop_build))
}
