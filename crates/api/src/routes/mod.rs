pub mod health;
pub mod jenkins;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /jenkins/proxy      progressive log relay (GET)
/// /jenkins/build      trigger a build (POST)
/// /jenkins/queue      queue item -> build number (GET)
/// /jenkins/status     build status (GET)
/// /jenkins/stop       abort a build (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/jenkins", jenkins::router())
}
