#![allow(dead_code)]

use api_scaffold::{AppConfig, AppState};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashMap;
use tower::ServiceExt;

pub fn state(mode: &str) -> AppState {
    let env: HashMap<&str, &str> = [
        ("APP_ENV", mode),
        ("DB_HOST", "127.0.0.1"),
        ("DB_USER", "app"),
        ("DB_NAME", "appdb"),
        ("BODY_LIMIT_BYTES", "2048"),
    ]
    .into_iter()
    .collect();
    let config = AppConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).expect("test config");
    AppState::new(config)
}

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

pub async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.expect("infallible router");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    Reply { status, body }
}

pub async fn get(app: &Router, uri: &str) -> Reply {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value, headers: &[(&str, &str)]) -> Reply {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub fn assert_timestamp(body: &Value) {
    let ts = body["timestamp"].as_str().expect("timestamp string");
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "bad timestamp {ts}");
}
