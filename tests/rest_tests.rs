//! Integration tests for the REST surface (`/tools`, `/call-tool`, `/health`)

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use toolgate::test_utils::{read_json, stub_router, StubBehavior};

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn test_list_tools() {
    let (app, _log) = stub_router(StubBehavior::Echo);

    let response = app.oneshot(get("/tools")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let names: Vec<_> = body["tools"]
        .as_array()
        .expect("tools array")
        .iter()
        .map(|t| t["name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["list_jobs", "echo", "get_project"]);
    assert!(body["tools"][0]["inputSchema"]["properties"]["instance"].is_object());
}

#[tokio::test]
async fn test_call_tool_success() {
    let (app, log) = stub_router(StubBehavior::Echo);

    let response = app
        .oneshot(post_json(
            "/call-tool",
            json!({"name": "echo", "arguments": {"text": "hello"}}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["isError"], json!(false));
    assert_eq!(body["content"][0]["type"], json!("text"));
    assert_eq!(log.invocations(), 1);
}

#[tokio::test]
async fn test_identical_calls_give_identical_envelopes() {
    let (app, _log) = stub_router(StubBehavior::Data(json!({"key": "ABC", "status": "OK"})));
    let body = json!({"name": "get_project", "arguments": {"projectKey": "ABC"}});

    let first = app
        .clone()
        .oneshot(post_json("/call-tool", body.clone()))
        .await
        .expect("response");
    let second = app
        .oneshot(post_json("/call-tool", body))
        .await
        .expect("response");

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(read_json(first).await, read_json(second).await);
}

#[tokio::test]
async fn test_call_tool_error_is_still_200() {
    let (app, _log) = stub_router(StubBehavior::Echo);

    let response = app
        .oneshot(post_json("/call-tool", json!({"name": "nonexistent_tool"})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["isError"], json!(true));
    assert_eq!(body["content"][0]["text"], json!("unknown tool: nonexistent_tool"));
}

#[tokio::test]
async fn test_call_tool_without_name_is_400() {
    let (app, log) = stub_router(StubBehavior::Echo);

    for body in [json!({}), json!({"name": ""}), json!({"arguments": {}})] {
        let response = app
            .clone()
            .oneshot(post_json("/call-tool", body))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert!(body["error"].is_string());
    }
    assert_eq!(log.invocations(), 0);
}

#[tokio::test]
async fn test_backend_panic_is_500() {
    let (app, _log) = stub_router(StubBehavior::Panic);

    let response = app
        .oneshot(post_json("/call-tool", json!({"name": "list_jobs"})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["error"], json!("Internal server error"));
}

#[tokio::test]
async fn test_health_does_not_touch_backends() {
    let (app, log) = stub_router(StubBehavior::Echo);

    let response = app.oneshot(get("/health")).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({"status": "ok", "system": "stub", "instances": ["prod", "staging", "team"]})
    );
    assert_eq!(log.connections(), 0);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (app, _log) = stub_router(StubBehavior::Echo);

    let request = Request::builder()
        .uri("/health")
        .header("origin", "https://client.example.com")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|h| h.to_str().ok()),
        Some("*")
    );
}
