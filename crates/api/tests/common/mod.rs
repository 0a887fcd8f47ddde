#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use tailboard_api::config::ServerConfig;
use tailboard_api::router::build_app_router;
use tailboard_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upstream_timeout_secs: 5,
    }
}

/// Build the full application router with all middleware layers, exactly
/// as `main.rs` does.
pub fn build_test_app() -> Router {
    let config = test_config();
    let state = AppState::new(config.clone()).unwrap();
    build_app_router(state, &config)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri).await
}

async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

// ---------------------------------------------------------------------------
// Fake job runner
// ---------------------------------------------------------------------------

/// One scripted progressive-log answer.
#[derive(Debug, Clone)]
pub struct FakeChunk {
    pub status: u16,
    pub body: &'static str,
    pub more_data: Option<&'static str>,
    pub text_size: Option<&'static str>,
}

impl FakeChunk {
    pub fn new(body: &'static str, more_data: Option<&'static str>, text_size: Option<&'static str>) -> Self {
        Self {
            status: 200,
            body,
            more_data,
            text_size,
        }
    }
}

/// A request the fake runner received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct FakeState {
    chunks: VecDeque<FakeChunk>,
    queued_build: Option<u64>,
    requests: Vec<Recorded>,
}

/// In-process stand-in for the job runner's REST surface.
#[derive(Clone, Default)]
pub struct FakeJenkins {
    state: Arc<Mutex<FakeState>>,
}

impl FakeJenkins {
    pub fn with_chunks(chunks: Vec<FakeChunk>) -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().chunks = chunks.into();
        fake
    }

    pub fn set_queued_build(&self, number: Option<u64>) {
        self.state.lock().unwrap().queued_build = number;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Serve on an ephemeral port and return its base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new().fallback(handle).with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

async fn handle(
    State(fake): State<FakeJenkins>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> axum::response::Response {
    let path = uri.path().to_string();
    let mut state = fake.state.lock().unwrap();
    state.requests.push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_owned),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    });

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("GET", ["job", _, _, "logText", "progressiveText"]) => {
            let chunk = if state.chunks.len() > 1 {
                state.chunks.pop_front()
            } else {
                state.chunks.front().cloned()
            };
            let Some(chunk) = chunk else {
                return StatusCode::NOT_FOUND.into_response();
            };
            let mut response = Response::builder().status(chunk.status);
            if let Some(v) = chunk.more_data {
                response = response.header("X-More-Data", v);
            }
            if let Some(v) = chunk.text_size {
                response = response.header("X-Text-Size", v);
            }
            response.body(Body::from(chunk.body)).unwrap()
        }
        ("POST", ["job", _, "build"]) => Response::builder()
            .status(StatusCode::CREATED)
            .header("Location", "http://jenkins.local/queue/item/42/")
            .body(Body::empty())
            .unwrap(),
        ("GET", ["queue", "item", _, "api", "json"]) => {
            let executable = state.queued_build.map(|n| serde_json::json!({ "number": n }));
            axum::Json(serde_json::json!({ "id": 42, "executable": executable })).into_response()
        }
        ("GET", ["job", _, build, "api", "json"]) => {
            let number: u64 = build.parse().unwrap_or(0);
            axum::Json(serde_json::json!({
                "number": number,
                "building": false,
                "result": "SUCCESS",
                "duration": 1234,
            }))
            .into_response()
        }
        ("POST", ["job", _, "404", "stop"]) => {
            (StatusCode::NOT_FOUND, "No such build").into_response()
        }
        ("POST", ["job", _, _, "stop"]) => StatusCode::OK.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
