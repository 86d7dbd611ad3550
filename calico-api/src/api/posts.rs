//! Post record endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use calico_common::db::Post;
use serde::{Deserialize, Serialize};

use super::users::MessageResponse;
use crate::db::posts;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub post: Post,
}

/// GET /api/posts
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<Json<PostListResponse>> {
    let posts = posts::list_posts(&state.db).await?;
    Ok(Json(PostListResponse { posts }))
}

/// GET /api/posts/:id
pub async fn get_post(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<PostResponse>> {
    let Path(post_id) = path?;
    let post = posts::get_post(&state.db, post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    Ok(Json(PostResponse {
        message: None,
        post,
    }))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PostResponse>)> {
    let Json(request) = payload?;

    let title = request.title.filter(|v| !v.is_empty());
    let content = request.content.filter(|v| !v.is_empty());
    let user_id = request.user_id.filter(|id| *id != 0);
    let (Some(title), Some(content), Some(user_id)) = (title, content, user_id) else {
        return Err(ApiError::BadRequest(
            "Title, content, and user_id are required".to_string(),
        ));
    };

    let post = posts::create_post(&state.db, &title, &content, user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            message: Some("Post created successfully".to_string()),
            post,
        }),
    ))
}

/// DELETE /api/posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(post_id) = path?;
    posts::delete_post(&state.db, post_id).await?;

    Ok(Json(MessageResponse {
        message: "Post deleted successfully".to_string(),
    }))
}

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route("/api/posts/:id", get(get_post).delete(delete_post))
}
