//! Song identity and rating endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use calico_common::db::{Rating, RatingType, SongSummary};
use serde::{Deserialize, Serialize};

use crate::db::{self, SubmitStatus};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub user_identifier: Option<String>,
    pub rating_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RateResponse {
    pub message: String,
    pub rating: Rating,
    pub song: SongSummary,
    pub updated: bool,
}

#[derive(Debug, Serialize)]
pub struct UserRatingResponse {
    pub has_rated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_type: Option<RatingType>,
}

#[derive(Debug, Deserialize)]
pub struct FindOrCreateRequest {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FindOrCreateResponse {
    pub song: SongSummary,
    pub created: bool,
}

/// Treat absent and empty fields alike
fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

/// POST /api/songs/:id/rate
///
/// 201 for a first vote, 200 for a repeated or changed vote.
pub async fn rate_song(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RateResponse>)> {
    let Path(song_id) = path?;
    let Json(request) = payload?;

    let (Some(listener), Some(rating_type)) =
        (present(request.user_identifier), present(request.rating_type))
    else {
        return Err(ApiError::BadRequest(
            "user_identifier and rating_type are required".to_string(),
        ));
    };
    let rating_type: RatingType = rating_type.parse()?;

    let submission = db::submit_rating(&state.db, song_id, &listener, rating_type).await?;
    let song = db::song_summary(&state.db, song_id).await?;

    let (status, message) = match submission.status {
        SubmitStatus::Created => (StatusCode::CREATED, "Rating submitted successfully"),
        SubmitStatus::Updated => (StatusCode::OK, "Rating updated successfully"),
        SubmitStatus::Unchanged => (StatusCode::OK, "Rating unchanged"),
    };
    let updated = submission.updated();

    Ok((
        status,
        Json(RateResponse {
            message: message.to_string(),
            rating: submission.rating,
            song,
            updated,
        }),
    ))
}

/// GET /api/songs/:id/ratings
pub async fn song_ratings(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<SongSummary>> {
    let Path(song_id) = path?;
    Ok(Json(db::song_summary(&state.db, song_id).await?))
}

/// GET /api/songs/:id/user-rating/:listener
pub async fn user_rating(
    State(state): State<AppState>,
    path: Result<Path<(i64, String)>, PathRejection>,
) -> ApiResult<Json<UserRatingResponse>> {
    let Path((song_id, listener)) = path?;
    let rating_type = db::lookup_rating(&state.db, song_id, &listener).await?;

    Ok(Json(UserRatingResponse {
        has_rated: rating_type.is_some(),
        rating_type,
    }))
}

/// POST /api/songs/find-or-create
///
/// 201 when the song was created by this call, 200 when it already existed.
pub async fn find_or_create_song(
    State(state): State<AppState>,
    payload: Result<Json<FindOrCreateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<FindOrCreateResponse>)> {
    let Json(request) = payload?;

    let (Some(title), Some(artist)) = (present(request.title), present(request.artist)) else {
        return Err(ApiError::BadRequest("title and artist are required".to_string()));
    };

    let (song, created) =
        db::resolve_song(&state.db, &title, &artist, request.album.as_deref()).await?;
    let counts = db::rating_counts(&state.db, song.id).await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(FindOrCreateResponse {
            song: SongSummary { song, counts },
            created,
        }),
    ))
}

pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/api/songs/find-or-create", post(find_or_create_song))
        .route("/api/songs/:id/rate", post(rate_song))
        .route("/api/songs/:id/ratings", get(song_ratings))
        .route("/api/songs/:id/user-rating/:listener", get(user_rating))
}
