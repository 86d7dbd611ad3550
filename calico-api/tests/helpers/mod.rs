//! Shared test helpers
//!
//! - In-memory application setup
//! - A local stand-in for the station's metadata server

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    routing::get,
    Json, Router,
};
use calico_api::services::{Endpoint, MetadataClient};
use calico_api::{build_router, AppState};
use calico_common::db::init_database;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_TIMEOUT: Duration = Duration::from_millis(500);

/// Paths requested from the fake station, in order
pub type Hits = Arc<Mutex<Vec<String>>>;

/// Base URL of a port nothing listens on
pub fn unreachable_base() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Metadata client whose every endpoint refuses connections
pub fn offline_metadata_client() -> MetadataClient {
    let base = unreachable_base();
    MetadataClient::new(
        Endpoint::new(format!("{}/metadata.json", base), TEST_TIMEOUT),
        vec![
            Endpoint::new(format!("{}/history.json", base), TEST_TIMEOUT),
            Endpoint::new(format!("{}/recent-tracks", base), TEST_TIMEOUT),
        ],
        format!("{}/cover.jpg", base),
    )
    .unwrap()
}

pub async fn test_pool() -> SqlitePool {
    init_database("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database")
}

pub fn app_with(pool: SqlitePool, metadata: MetadataClient) -> Router {
    build_router(
        AppState::new(pool, metadata),
        &["http://localhost:3000".to_string()],
    )
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Should read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn record(hits: &Hits, path: &str) {
    hits.lock().unwrap().push(path.to_string());
}

/// Start a fake station on an ephemeral port; returns its base URL and hit log
pub async fn spawn_station() -> (String, Hits) {
    let hits: Hits = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route(
            "/metadata.json",
            get(|State(hits): State<Hits>| async move {
                record(&hits, "/metadata.json");
                Json(json!({
                    "title": "Live Song",
                    "artist": "Live Artist",
                    "album": "Live Album",
                    "bit_depth": 24,
                    "sample_rate": 48000
                }))
            }),
        )
        .route(
            "/partial.json",
            get(|State(hits): State<Hits>| async move {
                record(&hits, "/partial.json");
                Json(json!({ "album": "Only An Album" }))
            }),
        )
        .route(
            "/broken",
            get(|State(hits): State<Hits>| async move {
                record(&hits, "/broken");
                StatusCode::INTERNAL_SERVER_ERROR
            }),
        )
        .route(
            "/not-json",
            get(|State(hits): State<Hits>| async move {
                record(&hits, "/not-json");
                "<html>station offline</html>"
            }),
        )
        .route(
            "/empty",
            get(|State(hits): State<Hits>| async move {
                record(&hits, "/empty");
                Json(json!([]))
            }),
        )
        .route(
            "/empty-object",
            get(|State(hits): State<Hits>| async move {
                record(&hits, "/empty-object");
                Json(json!({ "tracks": [] }))
            }),
        )
        .route(
            "/slow",
            get(|State(hits): State<Hits>| async move {
                record(&hits, "/slow");
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!([{ "title": "Too Late", "artist": "Nobody" }]))
            }),
        )
        .route(
            "/history-object",
            get(|State(hits): State<Hits>| async move {
                record(&hits, "/history-object");
                Json(json!({
                    "tracks": [
                        { "title": "Wrapped One", "artist": "W", "album": "WA", "playedAt": "2025-01-01T10:00:00Z" },
                        { "title": "Wrapped Two", "artist": "W" }
                    ]
                }))
            }),
        )
        .route(
            "/history-list",
            get(|State(hits): State<Hits>| async move {
                record(&hits, "/history-list");
                Json(json!([
                    { "title": "Listed", "artist": "L", "album": "LA", "playedAt": "2025-01-01T09:00:00Z" }
                ]))
            }),
        )
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), hits)
}

pub fn hits_of(hits: &Hits) -> Vec<String> {
    hits.lock().unwrap().clone()
}
