//! User records

use calico_common::db::User;
use calico_common::{time, Error, Result};
use sqlx::SqlitePool;
use tracing::info;

const SELECT_USERS: &str = r#"
    SELECT u.id, u.username, u.email, u.created_at,
           (SELECT COUNT(*) FROM posts p WHERE p.user_id = u.id) AS post_count
    FROM users u
"#;

/// All users, newest first
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "{} ORDER BY u.created_at DESC, u.id DESC",
        SELECT_USERS
    ))
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("{} WHERE u.id = ?", SELECT_USERS))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Create a user; duplicate username or email is `InvalidInput`
pub async fn create_user(pool: &SqlitePool, username: &str, email: &str) -> Result<User> {
    let taken: Option<(String, String)> = sqlx::query_as(
        "SELECT username, email FROM users WHERE username = ? OR email = ? LIMIT 1",
    )
    .bind(username)
    .bind(email)
    .fetch_optional(pool)
    .await?;

    if let Some((existing_username, _)) = taken {
        let message = if existing_username == username {
            "Username already exists"
        } else {
            "Email already exists"
        };
        return Err(Error::InvalidInput(message.to_string()));
    }

    let user_id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, email, created_at) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(username)
    .bind(email)
    .bind(time::now_rfc3339())
    .fetch_one(pool)
    .await
    .map_err(|e| match Error::from(e) {
        err if err.is_unique_violation() => {
            Error::InvalidInput("Username or email already exists".to_string())
        }
        err => err,
    })?;

    info!(user_id, username, "Created user");

    get_user(pool, user_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("User {} missing after insert", user_id)))
}

/// Delete a user together with their posts
pub async fn delete_user(pool: &SqlitePool, user_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM posts WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        // Dropping the transaction rolls it back
        return Err(Error::NotFound("User not found".to_string()));
    }

    tx.commit().await?;
    info!(user_id, "Deleted user");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calico_common::db::init_database;

    #[tokio::test]
    async fn test_create_and_list_users() {
        let pool = init_database("sqlite::memory:").await.unwrap();

        let alice = create_user(&pool, "alice", "alice@example.com").await.unwrap();
        let bob = create_user(&pool, "bob", "bob@example.com").await.unwrap();
        assert_eq!(alice.post_count, 0);

        let users = list_users(&pool).await.unwrap();
        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![bob.id, alice.id], "Newest first");
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_rejected() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        create_user(&pool, "alice", "alice@example.com").await.unwrap();

        match create_user(&pool, "alice", "other@example.com").await {
            Err(Error::InvalidInput(msg)) => assert_eq!(msg, "Username already exists"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
        match create_user(&pool, "alicia", "alice@example.com").await {
            Err(Error::InvalidInput(msg)) => assert_eq!(msg, "Email already exists"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_unknown_user() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        assert!(matches!(delete_user(&pool, 5).await, Err(Error::NotFound(_))));
    }
}
