#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    Router,
};
use hyper::StatusCode;
use serde_json::Value;
use tower::ServiceExt;

/// 2024-05-01T10:00:00Z
pub const START: i64 = 1_714_557_600_000;

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Option<String>, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Origin", "http://dashboard.local")
        .header("Content-Type", "application/json")
        .body(body.map(|b| Body::from(b.to_owned())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cors = response
        .headers()
        .get("access-control-allow-origin")
        .map(|v| v.to_str().unwrap().to_owned());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, cors, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, json) = send(app, "GET", uri, None).await;
    (status, json)
}

pub async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let (status, _, json) = send(app, "POST", uri, Some(body)).await;
    (status, json)
}
