use reqwest::header::LOCATION;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tailboard_core::progressive::{HEADER_MORE_DATA, HEADER_TEXT_SIZE};
use tailboard_core::target::Credentials;

/// HTTP client for a single Jenkins instance, bound to one set of
/// credentials.
#[derive(Debug, Clone)]
pub struct JenkinsApi {
    client: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

/// Raw progressive-log response, forwarded byte for byte by the relay.
#[derive(Debug, Clone)]
pub struct ProgressiveResponse {
    /// Upstream HTTP status code.
    pub status: u16,
    /// Response body, untouched.
    pub body: Vec<u8>,
    /// Raw `x-more-data` header value, if present.
    pub more_data: Option<String>,
    /// Raw `x-text-size` header value, if present.
    pub text_size: Option<String>,
}

/// Subset of `/job/{job}/{build}/api/json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub number: u64,
    pub building: bool,
    /// `SUCCESS`, `FAILURE`, `ABORTED`, ... or `null` while running.
    pub result: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueueItem {
    executable: Option<QueueExecutable>,
}

#[derive(Debug, Deserialize)]
struct QueueExecutable {
    number: u64,
}

/// Errors from the Jenkins REST layer.
#[derive(Debug, thiserror::Error)]
pub enum JenkinsError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    /// Jenkins returned a non-2xx status code.
    #[error("Jenkins API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The configured base address is not a usable HTTP URL.
    #[error("Invalid Jenkins URL: {0}")]
    InvalidUrl(String),

    /// A build was queued but Jenkins did not say where.
    #[error("Jenkins did not return a queue item location")]
    MissingLocation,
}

impl JenkinsApi {
    /// Create a client for the Jenkins instance at `base_url`.
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self, JenkinsError> {
        Self::with_client(reqwest::Client::new(), base_url, credentials)
    }

    /// Create a client reusing an existing [`reqwest::Client`] (shares the
    /// connection pool and timeout settings).
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        credentials: Credentials,
    ) -> Result<Self, JenkinsError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| JenkinsError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(JenkinsError::InvalidUrl(base_url.to_string()));
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

    /// `{base}/job/{job}/{build}/logText/progressiveText?start={start}`,
    /// with the job name encoded as a single path segment.
    pub fn progressive_text_url(&self, job_name: &str, build_number: u64, start: u64) -> Url {
        let build = build_number.to_string();
        let mut url = self.url(&["job", job_name, &build, "logText", "progressiveText"]);
        url.query_pairs_mut()
            .append_pair("start", &start.to_string());
        url
    }

    /// Fetch the console log from byte `start` onwards.
    ///
    /// Does not check the status code: the relay mirrors whatever Jenkins
    /// answered. Only transport failures are errors.
    pub async fn progressive_text(
        &self,
        job_name: &str,
        build_number: u64,
        start: u64,
    ) -> Result<ProgressiveResponse, JenkinsError> {
        let url = self.progressive_text_url(job_name, build_number, start);
        tracing::debug!(job = job_name, build_number, start, "Fetching progressive log");

        let response = self.authorized(self.client.get(url)).send().await?;

        let status = response.status().as_u16();
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let more_data = header(HEADER_MORE_DATA);
        let text_size = header(HEADER_TEXT_SIZE);
        let body = response.bytes().await?.to_vec();

        Ok(ProgressiveResponse {
            status,
            body,
            more_data,
            text_size,
        })
    }

    /// Queue a new build of `job_name`.
    ///
    /// Sends `POST /job/{job}/build?delay=0sec` and returns the queue item
    /// id taken from the `Location` header.
    pub async fn trigger_build(&self, job_name: &str) -> Result<u64, JenkinsError> {
        let mut url = self.url(&["job", job_name, "build"]);
        url.query_pairs_mut().append_pair("delay", "0sec");

        let response = self.authorized(self.client.post(url)).send().await?;
        let response = Self::ensure_success(response).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(JenkinsError::MissingLocation)?;
        let queue_id = parse_queue_id(location).ok_or(JenkinsError::MissingLocation)?;

        tracing::info!(job = job_name, queue_id, "Build queued");
        Ok(queue_id)
    }

    /// Build number assigned to a queue item, or `None` while it is still
    /// waiting for an executor.
    pub async fn queued_build_number(&self, queue_id: u64) -> Result<Option<u64>, JenkinsError> {
        let id = queue_id.to_string();
        let url = self.url(&["queue", "item", &id, "api", "json"]);

        let response = self.authorized(self.client.get(url)).send().await?;
        let item: QueueItem = Self::parse_response(response).await?;
        Ok(item.executable.map(|e| e.number))
    }

    /// Retrieve the status of a build.
    pub async fn build_info(
        &self,
        job_name: &str,
        build_number: u64,
    ) -> Result<BuildInfo, JenkinsError> {
        let build = build_number.to_string();
        let url = self.url(&["job", job_name, &build, "api", "json"]);

        let response = self.authorized(self.client.get(url)).send().await?;
        Self::parse_response(response).await
    }

    /// Abort a running build (`POST /job/{job}/{build}/stop`).
    pub async fn stop_build(&self, job_name: &str, build_number: u64) -> Result<(), JenkinsError> {
        let build = build_number.to_string();
        let url = self.url(&["job", job_name, &build, "stop"]);

        let response = self.authorized(self.client.post(url)).send().await?;
        Self::ensure_success(response).await?;
        tracing::info!(job = job_name, build_number, "Stop sent to Jenkins");
        Ok(())
    }

    // ---- private helpers ----

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `cannot_be_a_base` URLs are rejected in the constructor.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.credentials.username, Some(&self.credentials.api_token))
    }

    /// Returns the response unchanged on a success status, or a
    /// [`JenkinsError::Api`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, JenkinsError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(JenkinsError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, JenkinsError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Extract the numeric id from a queue location such as
/// `http://jenkins/queue/item/42/`.
pub fn parse_queue_id(location: &str) -> Option<u64> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
}
