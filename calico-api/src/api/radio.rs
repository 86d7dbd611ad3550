//! Now-playing and track-history endpoints
//!
//! Both endpoints answer 200 even when the station is unreachable; only a
//! storage failure turns into a 500.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::ApiResult;
use crate::services::{enrich_track, enrich_tracks, EnrichedTrack, StreamFormat};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct NowPlayingResponse {
    #[serde(flatten)]
    pub track: EnrichedTrack,
    #[serde(rename = "albumArt")]
    pub album_art: String,
    pub live: bool,
    /// `bit_depth` and `sample_rate`, always both present for a live track
    #[serde(flatten)]
    pub format: Option<StreamFormat>,
}

#[derive(Debug, Serialize)]
pub struct TrackHistoryResponse {
    pub tracks: Vec<EnrichedTrack>,
}

/// GET /api/nowplaying
pub async fn now_playing(State(state): State<AppState>) -> ApiResult<Json<NowPlayingResponse>> {
    let now = state.metadata.current_track().await;
    let track = enrich_track(&state.db, &now.track).await?;

    Ok(Json(NowPlayingResponse {
        track,
        album_art: now.album_art,
        live: now.live,
        format: now.format,
    }))
}

/// GET /api/trackhistory
pub async fn track_history(State(state): State<AppState>) -> ApiResult<Json<TrackHistoryResponse>> {
    let history = state.metadata.history().await;
    let tracks = enrich_tracks(&state.db, &history).await?;

    Ok(Json(TrackHistoryResponse { tracks }))
}

pub fn radio_routes() -> Router<AppState> {
    Router::new()
        .route("/api/nowplaying", get(now_playing))
        .route("/api/trackhistory", get(track_history))
}
