//! Build lifecycle relay: trigger, queue lookup, status and stop.
//!
//! Same credential parameters as the log relay. Nothing is persisted; the
//! runner remains the source of truth for every build.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tailboard_jenkins::BuildInfo;

use crate::error::AppResult;
use crate::handlers::params::RelayParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct QueuedBuild {
    pub queue_id: u64,
}

#[derive(Debug, Serialize)]
pub struct QueueStatus {
    pub queue_id: u64,
    /// `null` until an executor picks the item up.
    pub build_number: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct StopResult {
    pub stopped: bool,
}

/// POST /api/jenkins/build
///
/// Queue a new build of `jobName`. Returns 201 with the queue item id.
pub async fn trigger_build(
    State(state): State<AppState>,
    Query(params): Query<RelayParams>,
) -> AppResult<impl IntoResponse> {
    let (jenkins, job_name) = params.job(&state)?;
    let queue_id = jenkins.trigger_build(&job_name).await?;

    tracing::info!(job = %job_name, queue_id, "Build triggered");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: QueuedBuild { queue_id },
        }),
    ))
}

/// GET /api/jenkins/queue
///
/// Resolve a queue item to its build number, if one was assigned yet.
pub async fn queue_status(
    State(state): State<AppState>,
    Query(params): Query<RelayParams>,
) -> AppResult<Json<DataResponse<QueueStatus>>> {
    let (jenkins, queue_id) = params.queue_item(&state)?;
    let build_number = jenkins.queued_build_number(queue_id).await?;

    Ok(Json(DataResponse {
        data: QueueStatus {
            queue_id,
            build_number,
        },
    }))
}

/// GET /api/jenkins/status
pub async fn build_status(
    State(state): State<AppState>,
    Query(params): Query<RelayParams>,
) -> AppResult<Json<DataResponse<BuildInfo>>> {
    let (jenkins, job_name, build_number) = params.build(&state)?;
    let info = jenkins.build_info(&job_name, build_number).await?;

    Ok(Json(DataResponse { data: info }))
}

/// POST /api/jenkins/stop
///
/// Ask the runner to abort a build. Returns once the runner accepted the
/// request; the build may keep writing its log for a moment afterwards.
pub async fn stop_build(
    State(state): State<AppState>,
    Query(params): Query<RelayParams>,
) -> AppResult<Json<DataResponse<StopResult>>> {
    let (jenkins, job_name, build_number) = params.build(&state)?;
    jenkins.stop_build(&job_name, build_number).await?;

    tracing::info!(job = %job_name, build_number, "Build stop requested");

    Ok(Json(DataResponse {
        data: StopResult { stopped: true },
    }))
}
