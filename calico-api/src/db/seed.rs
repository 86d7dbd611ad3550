//! Sample data for local development

use calico_common::db::reset_database;
use calico_common::Result;
use sqlx::SqlitePool;
use tracing::info;

use super::posts::create_post;
use super::users::create_user;

const SAMPLE_USERS: [(&str, &str); 3] = [
    ("alice", "alice@example.com"),
    ("bob", "bob@example.com"),
    ("charlie", "charlie@example.com"),
];

const SAMPLE_POSTS: [(&str, &str); 3] = [
    (
        "Welcome to the Blog",
        "This is the first post on our blog! We are excited to share our thoughts and ideas with you.",
    ),
    (
        "Getting Started with Rust and Node.js",
        "In this post, we explore how to build a modern web application with a Rust backend and Node.js frontend.",
    ),
    (
        "The Future of Web Development",
        "Web development is constantly evolving. Let's discuss the latest trends and technologies.",
    ),
];

/// Wipe every table and insert three users with one post each
pub async fn seed_database(pool: &SqlitePool) -> Result<()> {
    reset_database(pool).await?;

    for ((username, email), (title, content)) in SAMPLE_USERS.iter().zip(SAMPLE_POSTS.iter()) {
        let user = create_user(pool, username, email).await?;
        create_post(pool, title, content, user.id).await?;
    }

    info!(
        users = SAMPLE_USERS.len(),
        posts = SAMPLE_POSTS.len(),
        "Database seeded with sample data"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::posts::list_posts;
    use crate::db::songs::resolve_song;
    use crate::db::users::list_users;
    use calico_common::db::init_database;

    #[tokio::test]
    async fn test_seed_replaces_existing_data() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        resolve_song(&pool, "A", "B", None).await.unwrap();

        seed_database(&pool).await.unwrap();
        // Seeding twice must not trip the username uniqueness constraint
        seed_database(&pool).await.unwrap();

        assert_eq!(list_users(&pool).await.unwrap().len(), 3);
        let posts = list_posts(&pool).await.unwrap();
        assert_eq!(posts.len(), 3);
        assert!(posts.iter().any(|p| p.author == "charlie"));

        let songs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(songs, 0);
    }
}
