//! Integration tests for the progressive-log relay (`GET /api/jenkins/proxy`).

mod common;

use axum::http::StatusCode;
use common::{body_json, body_text, dead_address, get, FakeChunk, FakeJenkins};

fn proxy_uri(base: &str, extra: &str) -> String {
    format!(
        "/api/jenkins/proxy?jenkinsUrl={base}&jobName=HelloJenkinsLive&buildNumber=3&username=admin&apiToken=secret{extra}"
    )
}

// ---------------------------------------------------------------------------
// Test: body, status and control headers are forwarded unchanged
// ---------------------------------------------------------------------------

#[tokio::test]
async fn relays_body_and_control_headers() {
    let fake = FakeJenkins::with_chunks(vec![FakeChunk::new(
        "line1\nline2\n",
        Some("true"),
        Some("12"),
    )]);
    let base = fake.spawn().await;

    let response = get(common::build_test_app(), &proxy_uri(&base, "&start=0")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-more-data"], "true");
    assert_eq!(response.headers()["x-text-size"], "12");
    assert_eq!(body_text(response).await, "line1\nline2\n");
}

// ---------------------------------------------------------------------------
// Test: upstream request shape (path, offset, basic auth)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn forwards_offset_and_basic_auth_to_runner() {
    let fake = FakeJenkins::with_chunks(vec![FakeChunk::new("", Some("true"), Some("40"))]);
    let base = fake.spawn().await;

    get(common::build_test_app(), &proxy_uri(&base, "&start=40")).await;

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.path, "/job/HelloJenkinsLive/3/logText/progressiveText");
    assert_eq!(request.query.as_deref(), Some("start=40"));
    // base64("admin:secret")
    assert_eq!(request.authorization.as_deref(), Some("Basic YWRtaW46c2VjcmV0"));
}

#[tokio::test]
async fn start_defaults_to_zero() {
    let fake = FakeJenkins::with_chunks(vec![FakeChunk::new("x", None, Some("1"))]);
    let base = fake.spawn().await;

    let response = get(common::build_test_app(), &proxy_uri(&base, "")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(fake.requests()[0].query.as_deref(), Some("start=0"));
}

#[tokio::test]
async fn job_name_is_path_encoded() {
    let fake = FakeJenkins::with_chunks(vec![FakeChunk::new("", None, Some("0"))]);
    let base = fake.spawn().await;

    let uri = format!(
        "/api/jenkins/proxy?jenkinsUrl={base}&jobName=team%2Fnightly%20build&buildNumber=1&username=u&apiToken=t"
    );
    get(common::build_test_app(), &uri).await;

    assert_eq!(
        fake.requests()[0].path,
        "/job/team%2Fnightly%20build/1/logText/progressiveText"
    );
}

// ---------------------------------------------------------------------------
// Test: absent headers stay absent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn absent_control_headers_are_not_invented() {
    let fake = FakeJenkins::with_chunks(vec![FakeChunk::new("tail end", None, None)]);
    let base = fake.spawn().await;

    let response = get(common::build_test_app(), &proxy_uri(&base, "&start=5")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-more-data").is_none());
    assert!(response.headers().get("x-text-size").is_none());
    assert_eq!(body_text(response).await, "tail end");
}

// ---------------------------------------------------------------------------
// Test: upstream status is mirrored
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upstream_status_is_preserved() {
    let fake = FakeJenkins::with_chunks(vec![FakeChunk {
        status: 404,
        body: "Not Found",
        more_data: None,
        text_size: None,
    }]);
    let base = fake.spawn().await;

    let response = get(common::build_test_app(), &proxy_uri(&base, "")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Not Found");
}

// ---------------------------------------------------------------------------
// Test: missing parameters → 400, no upstream call
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_job_name_returns_400_without_upstream_call() {
    let fake = FakeJenkins::default();
    let base = fake.spawn().await;

    let uri = format!(
        "/api/jenkins/proxy?jenkinsUrl={base}&buildNumber=1&start=0&username=admin&apiToken=secret"
    );
    let response = get(common::build_test_app(), &uri).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Missing parameters");
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn each_required_parameter_is_checked() {
    let fake = FakeJenkins::default();
    let base = fake.spawn().await;
    let full = [
        ("jenkinsUrl", base.as_str()),
        ("jobName", "job"),
        ("buildNumber", "1"),
        ("username", "admin"),
        ("apiToken", "secret"),
    ];

    for skipped in 0..full.len() {
        let query: Vec<String> = full
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skipped)
            .map(|(_, (k, v))| format!("{k}={v}"))
            .collect();
        let uri = format!("/api/jenkins/proxy?{}", query.join("&"));

        let response = get(common::build_test_app(), &uri).await;

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "omitting {} must be rejected",
            full[skipped].0
        );
        assert_eq!(body_json(response).await["error"], "Missing parameters");
    }
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn empty_parameter_counts_as_missing() {
    let response = get(
        common::build_test_app(),
        "/api/jenkins/proxy?jenkinsUrl=http://ci&jobName=&buildNumber=1&username=a&apiToken=b",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Missing parameters");
}

#[tokio::test]
async fn non_numeric_start_is_rejected() {
    let response = get(
        common::build_test_app(),
        "/api/jenkins/proxy?jenkinsUrl=http://ci&jobName=j&buildNumber=1&start=abc&username=a&apiToken=b",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid start value");
}

#[tokio::test]
async fn invalid_runner_url_is_rejected() {
    let response = get(
        common::build_test_app(),
        "/api/jenkins/proxy?jenkinsUrl=not-a-url&jobName=j&buildNumber=1&username=a&apiToken=b",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: unreachable runner → 500 with the transport message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_runner_returns_500_with_message() {
    let base = format!("http://{}", dead_address().await);

    let response = get(common::build_test_app(), &proxy_uri(&base, "")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UPSTREAM_UNAVAILABLE");
    let message = json["error"].as_str().unwrap();
    assert!(!message.is_empty());
}
