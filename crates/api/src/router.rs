//! Router assembly, shared by `main.rs` and the integration tests.

use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tailboard_core::progressive::{HEADER_MORE_DATA, HEADER_TEXT_SIZE};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// `/health` at the root, relay routes under `/api`, wrapped in the
/// middleware stack.
///
/// Outermost first: CORS, request id assignment, tracing, request id echo,
/// timeout, panic recovery. Tailing clients hit `/api/jenkins/proxy` once a
/// second each, so per-request spans are logged at `DEBUG`.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));
    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.request_timeout_secs),
    );

    routes::health::router()
        .nest("/api", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(timeout)
        .layer(PropagateRequestIdLayer::new(REQUEST_ID))
        .layer(trace)
        .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
        .layer(build_cors_layer(config))
        .with_state(state)
}

/// CORS for the browser dashboard.
///
/// Only GET and POST are routed. The progressive-log control headers are
/// exposed, otherwise a browser hides them from scripts.
///
/// # Panics
///
/// On an origin that is not a valid header value; this runs at startup.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([
            HeaderName::from_static(HEADER_MORE_DATA),
            HeaderName::from_static(HEADER_TEXT_SIZE),
        ])
        .max_age(Duration::from_secs(3600))
}
