//! Database initialization
//!
//! Creates the connection pool and the schema. Every statement is
//! idempotent, so calling [`init_database`] on an existing database is safe.
//!
//! Identity invariants live in the schema rather than in process memory,
//! since several server instances may share one database file:
//! - `songs`: UNIQUE(title, artist)
//! - `ratings`: UNIQUE(song_id, user_identifier)

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) the database at `database_url` and ensure the schema exists
///
/// `sqlite::memory:` URLs get a single long-lived connection so every query
/// sees the same in-memory database.
pub async fn init_database(database_url: &str) -> Result<SqlitePool> {
    let in_memory = database_url.contains(":memory:");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(5000));

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(10)
    };

    let pool = pool_options.connect_with(options).await?;

    if !in_memory {
        // WAL allows concurrent readers alongside the single writer
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;
    }

    create_schema(&pool).await?;
    info!("Database ready: {}", database_url);

    Ok(pool)
}

/// Create all tables (no-op for tables that already exist)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_posts_table(pool).await?;
    create_songs_table(pool).await?;
    create_ratings_table(pool).await?;
    Ok(())
}

/// Drop every table and recreate an empty schema
pub async fn reset_database(pool: &SqlitePool) -> Result<()> {
    for table in ["ratings", "songs", "posts", "users"] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }
    create_schema(pool).await?;
    info!("Database reset to empty schema");
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_posts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_user_id ON posts(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            album TEXT,
            UNIQUE(title, artist)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_ratings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ratings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            song_id INTEGER NOT NULL REFERENCES songs(id),
            user_identifier TEXT NOT NULL,
            rating_type TEXT NOT NULL CHECK (rating_type IN ('up', 'down')),
            created_at TEXT NOT NULL,
            UNIQUE(song_id, user_identifier)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_schema_is_shared_across_queries() {
        let pool = init_database("sqlite::memory:").await.unwrap();

        sqlx::query("INSERT INTO songs (title, artist, album) VALUES ('A', 'B', '')")
            .execute(&pool)
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_reset_database_empties_tables() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        sqlx::query("INSERT INTO songs (title, artist, album) VALUES ('A', 'B', '')")
            .execute(&pool)
            .await
            .unwrap();

        reset_database(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
