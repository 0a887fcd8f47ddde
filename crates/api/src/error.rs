use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tailboard_core::error::CoreError;
use tailboard_jenkins::JenkinsError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`JenkinsError`] plus request validation failures.
/// Implements [`IntoResponse`] to produce consistent `{"error", "code"}`
/// JSON responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `tailboard_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An error talking to the job runner.
    #[error(transparent)]
    Jenkins(#[from] JenkinsError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
                CoreError::UpstreamUnavailable(msg) => {
                    tracing::warn!(error = %msg, "Job runner unreachable");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "UPSTREAM_UNAVAILABLE",
                        msg.clone(),
                    )
                }
                CoreError::Http { status, message } => {
                    (upstream_status(*status), "UPSTREAM_ERROR", message.clone())
                }
                CoreError::Protocol(_) | CoreError::OffsetRegressed { .. } => {
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", core.to_string())
                }
            },

            // --- Job runner errors ---
            AppError::Jenkins(err) => match err {
                JenkinsError::Request(e) => {
                    tracing::warn!(error = %e, "Job runner unreachable");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "UPSTREAM_UNAVAILABLE",
                        e.to_string(),
                    )
                }
                JenkinsError::Api { status, body } => {
                    (upstream_status(*status), "UPSTREAM_ERROR", body.clone())
                }
                JenkinsError::InvalidUrl(_) => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", err.to_string())
                }
                JenkinsError::MissingLocation => {
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", err.to_string())
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Mirror an upstream status, falling back to 502 for codes axum rejects.
fn upstream_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
}
