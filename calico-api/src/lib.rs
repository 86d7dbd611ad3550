//! calico-api library - Radio Calico backend
//!
//! REST API serving blog records, a now-playing mirror of the station's
//! metadata feed, and anonymous one-vote-per-listener song ratings.

use axum::http::HeaderValue;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};
use crate::services::MetadataClient;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Station metadata client
    pub metadata: Arc<MetadataClient>,
}

impl AppState {
    pub fn new(db: SqlitePool, metadata: MetadataClient) -> Self {
        Self {
            db,
            metadata: Arc::new(metadata),
        }
    }
}

/// Build application router
///
/// Only `cors_origins` may call the API from a browser; `"*"` allows any
/// origin, and entries that are not valid header values are skipped with a
/// warning.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::radio_routes())
        .merge(api::song_routes())
        .merge(api::user_routes())
        .merge(api::post_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if cors_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}
