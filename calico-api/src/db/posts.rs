//! Post records

use calico_common::db::Post;
use calico_common::{time, Error, Result};
use sqlx::SqlitePool;
use tracing::info;

use super::users::get_user;

const SELECT_POSTS: &str = r#"
    SELECT p.id, p.title, p.content, p.user_id, u.username AS author, p.created_at
    FROM posts p
    JOIN users u ON u.id = p.user_id
"#;

/// All posts, newest first
pub async fn list_posts(pool: &SqlitePool) -> Result<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        "{} ORDER BY p.created_at DESC, p.id DESC",
        SELECT_POSTS
    ))
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

pub async fn get_post(pool: &SqlitePool, post_id: i64) -> Result<Option<Post>> {
    let post = sqlx::query_as::<_, Post>(&format!("{} WHERE p.id = ?", SELECT_POSTS))
        .bind(post_id)
        .fetch_optional(pool)
        .await?;

    Ok(post)
}

/// Create a post owned by `user_id`; `NotFound` if the user does not exist
pub async fn create_post(pool: &SqlitePool, title: &str, content: &str, user_id: i64) -> Result<Post> {
    if get_user(pool, user_id).await?.is_none() {
        return Err(Error::NotFound("User not found".to_string()));
    }

    let post_id: i64 = sqlx::query_scalar(
        "INSERT INTO posts (title, content, user_id, created_at) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(title)
    .bind(content)
    .bind(user_id)
    .bind(time::now_rfc3339())
    .fetch_one(pool)
    .await?;

    info!(post_id, user_id, "Created post");

    get_post(pool, post_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Post {} missing after insert", post_id)))
}

pub async fn delete_post(pool: &SqlitePool, post_id: i64) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(post_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(Error::NotFound("Post not found".to_string()));
    }

    info!(post_id, "Deleted post");
    Ok(())
}
