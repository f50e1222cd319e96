use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use codemate_core::{Catalog, Fetch, FetchError, Resolver, TieredCache};

struct Unreachable;

#[async_trait]
impl Fetch for Unreachable {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        Err(FetchError::Transport("dns error".into()))
    }
}

fn app() -> axum::Router {
    let resolver = Resolver::new(
        Arc::new(Unreachable),
        Arc::new(TieredCache::new(
            Duration::from_secs(6 * 3600),
            Duration::from_secs(24 * 3600),
        )),
        Arc::new(Catalog::bundled().unwrap()),
        Duration::from_secs(24 * 3600),
    );
    codemate_server::router(resolver)
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let resp = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn single_tool_is_url_decoded_and_case_insensitive() {
    let (status, body) = get("/api/tool/github%20copilot").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["toolId"], "GitHub Copilot");
    let tiers = body["tiers"].as_array().unwrap();
    assert_eq!(tiers.len(), 3);
    assert_eq!(tiers[0]["name"], "Individual");
    assert_eq!(tiers[0]["priceMonth"], 10.0);
    assert_eq!(tiers[0]["annualDiscountPercentage"], 16.67);
}

#[tokio::test]
async fn unknown_tool_is_404_with_message() {
    let (status, body) = get("/api/tool/Notepad").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, serde_json::json!({ "message": "Tool Notepad not found" }));
}

#[tokio::test]
async fn compare_follows_request_order() {
    let (status, body) = get("/api/compare?tools=Tabnine,Cursor").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["toolId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["Tabnine", "Cursor"]);
}

#[tokio::test]
async fn compare_returns_found_subset() {
    let (status, body) = get("/api/compare?tools=Cursor,Notepad").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn compare_all_unknown_is_404() {
    let (status, body) = get("/api/compare?tools=Notepad,Vim").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn compare_rejects_bad_cardinality() {
    for uri in [
        "/api/compare",
        "/api/compare?tools=",
        "/api/compare?tools=,,",
        "/api/compare?tools=Cursor,Tabnine,AskCodi",
    ] {
        let (status, body) = get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["message"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn tool_list_matches_catalog() {
    let (status, body) = get("/api/tools").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(ids[0], "GitHub Copilot");
    assert!(ids.contains(&"Cursor"));
    assert_eq!(ids.len(), 6);
}
