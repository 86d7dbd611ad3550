//! User record endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use calico_common::db::User;
use serde::{Deserialize, Serialize};

use crate::db::users;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UserListResponse>> {
    let users = users::list_users(&state.db).await?;
    Ok(Json(UserListResponse { users }))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Path(user_id) = path?;
    let user = users::get_user(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        message: None,
        user,
    }))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let Json(request) = payload?;

    let username = request.username.filter(|v| !v.is_empty());
    let email = request.email.filter(|v| !v.is_empty());
    let (Some(username), Some(email)) = (username, email) else {
        return Err(ApiError::BadRequest(
            "Username and email are required".to_string(),
        ));
    };

    let user = users::create_user(&state.db, &username, &email).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: Some("User created successfully".to_string()),
            user,
        }),
    ))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(user_id) = path?;
    users::delete_user(&state.db, user_id).await?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/:id", get(get_user).delete(delete_user))
}
