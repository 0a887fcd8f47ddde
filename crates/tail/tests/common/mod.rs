#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Response, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use tokio::sync::watch;

use tailboard_api::config::ServerConfig;
use tailboard_api::router::build_app_router;
use tailboard_api::state::AppState;
use tailboard_core::target::{Credentials, TailTarget};
use tailboard_tail::config::TailerSettings;
use tailboard_tail::relay::RelayClient;
use tailboard_tail::tailer::View;

pub const JOB: &str = "HelloJenkinsLive";

pub fn credentials() -> Credentials {
    Credentials::new("admin", "secret")
}

/// Fast timings so a whole session fits in well under a second.
pub fn fast_settings() -> TailerSettings {
    TailerSettings {
        poll_interval: Duration::from_millis(50),
        render_interval: Duration::ZERO,
        max_lines: 3000,
        visible_lines: 1000,
        poll_timeout: Duration::from_secs(5),
        error_dismiss: Duration::from_secs(60),
    }
}

pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Run the relay on an ephemeral port and return its base URL.
pub async fn spawn_relay() -> String {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upstream_timeout_secs: 5,
    };
    let state = AppState::new(config.clone()).unwrap();
    serve(build_app_router(state, &config)).await
}

pub fn relay_client(relay_url: &str) -> RelayClient {
    RelayClient::new(relay_url, credentials()).unwrap()
}

pub fn target(runner_url: &str, build: u64) -> TailTarget {
    TailTarget::new(runner_url, JOB, build)
}

/// Wait until a published view satisfies `done`.
pub async fn wait_for_view(
    views: &mut watch::Receiver<View>,
    done: impl Fn(&View) -> bool,
) -> View {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let view = views.borrow_and_update();
                if done(&view) {
                    return view.clone();
                }
            }
            views.changed().await.unwrap();
        }
    })
    .await
    .expect("view did not reach the expected state in time")
}

// ---------------------------------------------------------------------------
// Fake job runner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Chunk {
    pub status: u16,
    pub body: &'static str,
    pub more_data: bool,
    pub text_size: u64,
}

impl Chunk {
    pub fn ok(body: &'static str, more_data: bool, text_size: u64) -> Self {
        Self {
            status: 200,
            body,
            more_data,
            text_size,
        }
    }
}

#[derive(Default)]
struct RunnerState {
    chunks: VecDeque<Chunk>,
    starts: Vec<String>,
    /// Queue lookups answered with "still waiting" before a number is given.
    queue_delay: usize,
    assigned_build: Option<u64>,
}

#[derive(Clone, Default)]
pub struct FakeRunner {
    state: Arc<Mutex<RunnerState>>,
}

impl FakeRunner {
    pub fn with_chunks(chunks: Vec<Chunk>) -> Self {
        let runner = Self::default();
        runner.state.lock().unwrap().chunks = chunks.into();
        runner
    }

    /// Answer queue lookups with `build` after `delay` pending answers.
    pub fn assign_build_after(&self, delay: usize, build: Option<u64>) {
        let mut state = self.state.lock().unwrap();
        state.queue_delay = delay;
        state.assigned_build = build;
    }

    /// `start` query values of every progressive-log request.
    pub fn starts(&self) -> Vec<String> {
        self.state.lock().unwrap().starts.clone()
    }

    pub async fn spawn(&self) -> String {
        serve(Router::new().fallback(handle).with_state(self.clone())).await
    }
}

async fn handle(State(runner): State<FakeRunner>, method: Method, uri: Uri) -> axum::response::Response {
    let mut state = runner.state.lock().unwrap();
    let path = uri.path().to_string();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["job", _, _, "logText", "progressiveText"]) => {
            let start = uri
                .query()
                .and_then(|q| q.strip_prefix("start="))
                .unwrap_or_default()
                .to_string();
            state.starts.push(start);
            let chunk = if state.chunks.len() > 1 {
                state.chunks.pop_front()
            } else {
                state.chunks.front().cloned()
            };
            let Some(chunk) = chunk else {
                return StatusCode::NOT_FOUND.into_response();
            };
            let mut response = Response::builder()
                .status(chunk.status)
                .header("X-Text-Size", chunk.text_size.to_string());
            if chunk.more_data {
                response = response.header("X-More-Data", "true");
            }
            response.body(Body::from(chunk.body)).unwrap()
        }
        ("POST", ["job", _, "build"]) => Response::builder()
            .status(StatusCode::CREATED)
            .header("Location", "http://runner.local/queue/item/9/")
            .body(Body::empty())
            .unwrap(),
        ("GET", ["queue", "item", _, "api", "json"]) => {
            let executable = if state.queue_delay > 0 {
                state.queue_delay -= 1;
                None
            } else {
                state.assigned_build.map(|n| serde_json::json!({ "number": n }))
            };
            axum::Json(serde_json::json!({ "id": 9, "executable": executable })).into_response()
        }
        ("GET", ["job", _, build, "api", "json"]) => axum::Json(serde_json::json!({
            "number": build.parse::<u64>().unwrap_or(0),
            "building": true,
            "result": null,
        }))
        .into_response(),
        ("POST", ["job", _, _, "stop"]) => StatusCode::OK.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
