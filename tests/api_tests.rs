mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{harness, Harness};
use serde_json::Value;
use site_cloner::api::routes::create_router;
use site_cloner::AppState;
use tower::ServiceExt;

const ANSWER: &str = "```html\n<!DOCTYPE html><html><body><p>Cloned</p></body></html>\n```";

fn router(h: Harness) -> (Router, tempfile::TempDir) {
    let state = AppState {
        pipeline: Arc::new(h.pipeline),
        request_timeout: Duration::from_secs(30),
        cors_origin: None,
    };
    (create_router(state), h.dir)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn clone_request(url: &str) -> Request<Body> {
    Request::post("/clone")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "url": url }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _dir) = router(harness(0, vec![]).await);

    let (status, body) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["message"], "Website Cloning API is running");
}

#[tokio::test]
async fn test_clone_list_and_fetch() {
    let (app, _dir) = router(harness(0, vec![Ok(ANSWER.to_string())]).await);

    let (status, body) = send(&app, clone_request("https://example.com/")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["meta"]["status"], "success");
    assert_eq!(json["data"]["url"], "https://example.com/");
    assert_eq!(json["data"]["html"], "<!DOCTYPE html><html><body><p>Cloned</p></body></html>");
    let filename = json["data"]["filename"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Request::get("/clones").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["filename"], filename.as_str());

    let uri = format!("/clones/{}", filename);
    let (status, body) = send(&app, Request::get(uri.as_str()).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "<!DOCTYPE html><html><body><p>Cloned</p></body></html>"
    );
}

#[tokio::test]
async fn test_unsafe_url_is_bad_request() {
    let (app, _dir) = router(harness(0, vec![]).await);

    let (status, body) = send(&app, clone_request("http://localhost:8080/admin")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["meta"]["status"], "error");
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn test_scrape_exhaustion_is_service_unavailable() {
    let (app, _dir) = router(harness(3, vec![]).await);

    let (status, _) = send(&app, clone_request("https://example.com/")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_clone_is_not_found() {
    let (app, _dir) = router(harness(0, vec![]).await);

    let uri = format!("/clones/{}.html", uuid::Uuid::new_v4());
    let (status, body) = send(&app, Request::get(uri.as_str()).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["meta"]["status_code"], 404);
}
