//! Progressive-log relay.
//!
//! Forwards one tailing request to the job runner with injected basic-auth
//! credentials and hands the answer back unchanged: same status, same body
//! bytes, and the two control headers the client advances its cursor with.

use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tailboard_core::error::CoreError;
use tailboard_core::progressive::{HEADER_MORE_DATA, HEADER_TEXT_SIZE};

use crate::error::AppResult;
use crate::handlers::params::RelayParams;
use crate::state::AppState;

/// GET /api/jenkins/proxy
///
/// Query: `jenkinsUrl`, `jobName`, `buildNumber`, `start`, `username`,
/// `apiToken`. Returns 400 without contacting the runner when a parameter
/// is missing, 500 with the transport error when the runner is unreachable.
/// Never retries.
pub async fn proxy_progressive_log(
    State(state): State<AppState>,
    Query(params): Query<RelayParams>,
) -> AppResult<Response> {
    let request = params.progressive(&state)?;

    let upstream = request
        .jenkins
        .progressive_text(&request.job_name, request.build_number, request.start)
        .await
        .map_err(|e| CoreError::UpstreamUnavailable(e.to_string()))?;

    tracing::debug!(
        job = %request.job_name,
        build_number = request.build_number,
        start = request.start,
        status = upstream.status,
        bytes = upstream.body.len(),
        more_data = upstream.more_data.as_deref(),
        text_size = upstream.text_size.as_deref(),
        "Relayed progressive log",
    );

    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    forward_header(&mut headers, HEADER_MORE_DATA, upstream.more_data.as_deref());
    forward_header(&mut headers, HEADER_TEXT_SIZE, upstream.text_size.as_deref());

    Ok((status, headers, upstream.body).into_response())
}

fn forward_header(headers: &mut HeaderMap, name: &'static str, value: Option<&str>) {
    if let Some(value) = value.and_then(|v| HeaderValue::from_str(v).ok()) {
        headers.insert(name, value);
    }
}
