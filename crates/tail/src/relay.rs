//! HTTP client for the tailboard relay server.
//!
//! The relay holds no credentials of its own; every call carries the
//! runner address and credentials as query parameters.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use tailboard_core::error::CoreError;
use tailboard_core::progressive::{ProgressiveChunk, HEADER_MORE_DATA, HEADER_TEXT_SIZE};
use tailboard_core::target::{Credentials, TailTarget};

/// Spacing between queue lookups while waiting for a build number.
pub const QUEUE_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Errors from talking to the relay.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The relay could not be reached or the connection broke.
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    /// The relay answered with a non-2xx status.
    #[error("HTTP error {status}: {message}")]
    Status { status: u16, message: String },

    /// The relay reached its deadline or could not connect to the runner.
    #[error("{0}")]
    RunnerUnavailable(String),

    #[error("invalid relay URL: {0}")]
    InvalidUrl(String),

    /// The response did not have the expected shape.
    #[error("{0}")]
    Protocol(String),

    /// The control headers of a log chunk could not be decoded.
    #[error("{0}")]
    Chunk(CoreError),

    #[error("build was not scheduled within {0:?}")]
    QueueTimeout(Duration),
}

impl From<RelayError> for CoreError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Request(e) => CoreError::UpstreamUnavailable(e.to_string()),
            RelayError::Status { status, message } => CoreError::Http { status, message },
            RelayError::RunnerUnavailable(msg) => CoreError::UpstreamUnavailable(msg),
            RelayError::InvalidUrl(msg) => CoreError::BadRequest(msg),
            RelayError::Protocol(msg) => CoreError::Protocol(msg),
            RelayError::Chunk(err) => err,
            e @ RelayError::QueueTimeout(_) => CoreError::UpstreamUnavailable(e.to_string()),
        }
    }
}

/// Query string shared by every relay route.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayQuery<'a> {
    jenkins_url: &'a str,
    username: &'a str,
    api_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    build_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<u64>,
}

#[derive(Deserialize)]
struct Data<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    code: Option<String>,
}

/// Error code the relay uses when the runner could not be reached in time.
const CODE_UPSTREAM_UNAVAILABLE: &str = "UPSTREAM_UNAVAILABLE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QueuedBuild {
    pub queue_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QueueStatus {
    pub queue_id: u64,
    pub build_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildStatus {
    pub number: u64,
    pub building: bool,
    pub result: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StopResult {
    pub stopped: bool,
}

/// Client for the relay's `/api/jenkins/*` routes.
#[derive(Clone)]
pub struct RelayClient {
    client: Client,
    base_url: Url,
    credentials: Credentials,
}

impl std::fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayClient")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl RelayClient {
    pub fn new(relay_url: &str, credentials: Credentials) -> Result<Self, RelayError> {
        Self::with_client(Client::new(), relay_url, credentials)
    }

    pub fn with_client(
        client: Client,
        relay_url: &str,
        credentials: Credentials,
    ) -> Result<Self, RelayError> {
        let mut base_url =
            Url::parse(relay_url).map_err(|e| RelayError::InvalidUrl(format!("{relay_url}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(RelayError::InvalidUrl(relay_url.to_string()));
        }
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the log of `target` from byte `offset` onwards.
    pub async fn progressive_text(
        &self,
        target: &TailTarget,
        offset: u64,
    ) -> Result<ProgressiveChunk, RelayError> {
        let query = RelayQuery {
            job_name: Some(&target.job_name),
            build_number: Some(target.build_number),
            start: Some(offset),
            ..self.query(&target.endpoint)
        };
        let response = self
            .client
            .get(self.route("api/jenkins/proxy")?)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response.text().await.unwrap_or_default()));
        }

        let more_data = header_value(&response, HEADER_MORE_DATA);
        let text_size = header_value(&response, HEADER_TEXT_SIZE);
        let body = response.bytes().await?;

        tracing::trace!(
            build = %target,
            offset,
            bytes = body.len(),
            more_data = more_data.as_deref(),
            text_size = text_size.as_deref(),
            "Relay chunk received"
        );

        ProgressiveChunk::from_headers(&body, offset, more_data.as_deref(), text_size.as_deref())
            .map_err(RelayError::Chunk)
    }

    /// Queue a new build of `job_name` and return its queue item id.
    pub async fn trigger_build(&self, endpoint: &str, job_name: &str) -> Result<u64, RelayError> {
        let query = RelayQuery {
            job_name: Some(job_name),
            ..self.query(endpoint)
        };
        let queued: QueuedBuild = self
            .send_json(self.client.post(self.route("api/jenkins/build")?).query(&query))
            .await?;
        Ok(queued.queue_id)
    }

    pub async fn queue_status(&self, endpoint: &str, queue_id: u64) -> Result<QueueStatus, RelayError> {
        let query = RelayQuery {
            queue_id: Some(queue_id),
            ..self.query(endpoint)
        };
        self.send_json(self.client.get(self.route("api/jenkins/queue")?).query(&query))
            .await
    }

    pub async fn build_status(&self, target: &TailTarget) -> Result<BuildStatus, RelayError> {
        let query = RelayQuery {
            job_name: Some(&target.job_name),
            build_number: Some(target.build_number),
            ..self.query(&target.endpoint)
        };
        self.send_json(self.client.get(self.route("api/jenkins/status")?).query(&query))
            .await
    }

    pub async fn stop_build(&self, target: &TailTarget) -> Result<bool, RelayError> {
        let query = RelayQuery {
            job_name: Some(&target.job_name),
            build_number: Some(target.build_number),
            ..self.query(&target.endpoint)
        };
        let result: StopResult = self
            .send_json(self.client.post(self.route("api/jenkins/stop")?).query(&query))
            .await?;
        Ok(result.stopped)
    }

    /// Poll the queue item every `interval` until it has a build number or
    /// `max_wait` elapses.
    pub async fn wait_for_build_number(
        &self,
        endpoint: &str,
        queue_id: u64,
        interval: Duration,
        max_wait: Duration,
    ) -> Result<u64, RelayError> {
        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            let status = self.queue_status(endpoint, queue_id).await?;
            if let Some(number) = status.build_number {
                tracing::info!(queue_id, build_number = number, "Queued build started");
                return Ok(number);
            }
            if tokio::time::Instant::now() + interval > deadline {
                return Err(RelayError::QueueTimeout(max_wait));
            }
            tracing::debug!(queue_id, "Build still queued");
            tokio::time::sleep(interval).await;
        }
    }

    fn query<'a>(&'a self, endpoint: &'a str) -> RelayQuery<'a> {
        RelayQuery {
            jenkins_url: endpoint,
            username: &self.credentials.username,
            api_token: &self.credentials.api_token,
            job_name: None,
            build_number: None,
            queue_id: None,
            start: None,
        }
    }

    fn route(&self, path: &str) -> Result<Url, RelayError> {
        self.base_url
            .join(path)
            .map_err(|e| RelayError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RelayError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, body));
        }
        let envelope: Data<T> = serde_json::from_str(&body)
            .map_err(|e| RelayError::Protocol(format!("unexpected relay response: {e}")))?;
        Ok(envelope.data)
    }
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Prefer the relay's `{"error": ...}` message, then the raw body, then the
/// status reason. A runner outage reported by the relay keeps its kind.
fn status_error(status: StatusCode, body: String) -> RelayError {
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) if parsed.code.as_deref() == Some(CODE_UPSTREAM_UNAVAILABLE) => {
            return RelayError::RunnerUnavailable(parsed.error);
        }
        Ok(parsed) => parsed.error,
        Err(_) if !body.trim().is_empty() => body.trim().chars().take(200).collect(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    RelayError::Status {
        status: status.as_u16(),
        message,
    }
}
