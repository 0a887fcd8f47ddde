//! Query parameters shared by every relay endpoint.
//!
//! The dashboard sends the runner address and credentials on each call;
//! nothing is stored server-side.

use serde::Deserialize;
use tailboard_core::target::Credentials;
use tailboard_jenkins::JenkinsApi;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Message returned when any required parameter is absent or empty.
pub const MISSING_PARAMETERS: &str = "Missing parameters";

/// Raw relay query string. Every field is optional at the type level so
/// that a missing field produces our own 400 instead of axum's rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayParams {
    pub jenkins_url: Option<String>,
    pub job_name: Option<String>,
    pub build_number: Option<String>,
    pub queue_id: Option<String>,
    pub start: Option<String>,
    pub username: Option<String>,
    pub api_token: Option<String>,
}

/// A validated progressive-log request.
#[derive(Debug)]
pub struct ProgressiveRequest {
    pub jenkins: JenkinsApi,
    pub job_name: String,
    pub build_number: u64,
    pub start: u64,
}

impl RelayParams {
    /// Validate the parameters of `GET /api/jenkins/proxy`.
    ///
    /// All parameters but `start` are required; `start` defaults to `0`.
    /// Presence is checked before any value is parsed.
    pub fn progressive(&self, state: &AppState) -> AppResult<ProgressiveRequest> {
        let (url, job_name, build, username, token) = match (
            present(&self.jenkins_url),
            present(&self.job_name),
            present(&self.build_number),
            present(&self.username),
            present(&self.api_token),
        ) {
            (Some(u), Some(j), Some(b), Some(n), Some(t)) => (u, j, b, n, t),
            _ => return Err(missing()),
        };

        let build_number = parse_u64(build, "buildNumber")?;
        let start = match present(&self.start) {
            Some(raw) => parse_u64(raw, "start")?,
            None => 0,
        };

        Ok(ProgressiveRequest {
            jenkins: client(state, url, username, token)?,
            job_name: job_name.to_string(),
            build_number,
            start,
        })
    }

    /// Runner client plus job name, for endpoints addressing a job.
    pub fn job(&self, state: &AppState) -> AppResult<(JenkinsApi, String)> {
        let job_name = present(&self.job_name).ok_or_else(missing)?;
        Ok((self.jenkins(state)?, job_name.to_string()))
    }

    /// Runner client, job name and build number, for endpoints addressing a
    /// single build.
    pub fn build(&self, state: &AppState) -> AppResult<(JenkinsApi, String, u64)> {
        let build = present(&self.build_number).ok_or_else(missing)?;
        let (jenkins, job_name) = self.job(state)?;
        Ok((jenkins, job_name, parse_u64(build, "buildNumber")?))
    }

    /// Runner client and queue item id.
    pub fn queue_item(&self, state: &AppState) -> AppResult<(JenkinsApi, u64)> {
        let queue_id = present(&self.queue_id).ok_or_else(missing)?;
        let jenkins = self.jenkins(state)?;
        Ok((jenkins, parse_u64(queue_id, "queueId")?))
    }

    fn jenkins(&self, state: &AppState) -> AppResult<JenkinsApi> {
        match (
            present(&self.jenkins_url),
            present(&self.username),
            present(&self.api_token),
        ) {
            (Some(url), Some(username), Some(token)) => client(state, url, username, token),
            _ => Err(missing()),
        }
    }
}

fn client(state: &AppState, url: &str, username: &str, token: &str) -> AppResult<JenkinsApi> {
    Ok(JenkinsApi::with_client(
        state.http.clone(),
        url,
        Credentials::new(username, token),
    )?)
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn missing() -> AppError {
    AppError::BadRequest(MISSING_PARAMETERS.to_string())
}

fn parse_u64(raw: &str, name: &str) -> AppResult<u64> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {name} value")))
}
