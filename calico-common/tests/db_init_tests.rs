//! Tests for database initialization
//!
//! Covers:
//! - Automatic database creation on first run
//! - Idempotent re-initialization of an existing file
//! - Storage-level uniqueness of songs and ratings
//! - Classification of lock contention between writers

use calico_common::db::init::init_database;
use calico_common::Error;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tempfile::TempDir;

async fn file_database(dir: &TempDir) -> (String, SqlitePool) {
    let db_path = dir.path().join("calico-test.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = init_database(&url).await.expect("Database initialization failed");
    (url, pool)
}

async fn table_names(pool: &SqlitePool) -> Vec<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("calico-test.db");
    assert!(!db_path.exists());

    let (_url, pool) = file_database(&dir).await;

    assert!(db_path.exists(), "Database file was not created");
    assert_eq!(
        table_names(&pool).await,
        vec!["posts", "ratings", "songs", "users"]
    );
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let (url, pool) = file_database(&dir).await;

    sqlx::query("INSERT INTO songs (title, artist, album) VALUES ('Kept', 'Across Restarts', '')")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let reopened = init_database(&url).await.expect("Failed to open existing database");
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
        .fetch_one(&reopened)
        .await
        .unwrap();
    assert_eq!(count, 1, "Re-initialization must not drop existing rows");
}

#[tokio::test]
async fn test_song_title_artist_pair_is_unique() {
    let pool = init_database("sqlite::memory:").await.unwrap();

    sqlx::query("INSERT INTO songs (title, artist, album) VALUES ('A', 'B', 'First')")
        .execute(&pool)
        .await
        .unwrap();

    let duplicate = sqlx::query("INSERT INTO songs (title, artist, album) VALUES ('A', 'B', 'Second')")
        .execute(&pool)
        .await;
    let err = calico_common::Error::from(duplicate.unwrap_err());
    assert!(err.is_unique_violation());

    // Exact match only: a trailing space is a different song
    sqlx::query("INSERT INTO songs (title, artist, album) VALUES ('A ', 'B', '')")
        .execute(&pool)
        .await
        .expect("Distinct strings must not collide");
}

#[tokio::test]
async fn test_rating_song_listener_pair_is_unique() {
    let pool = init_database("sqlite::memory:").await.unwrap();

    sqlx::query("INSERT INTO songs (title, artist, album) VALUES ('A', 'B', '')")
        .execute(&pool)
        .await
        .unwrap();

    let insert = "INSERT INTO ratings (song_id, user_identifier, rating_type, created_at) VALUES (1, 'x', ?, '2024-01-01T00:00:00Z')";
    sqlx::query(insert).bind("up").execute(&pool).await.unwrap();

    let duplicate = sqlx::query(insert).bind("down").execute(&pool).await;
    assert!(calico_common::Error::from(duplicate.unwrap_err()).is_unique_violation());
}

#[tokio::test]
async fn test_rating_type_check_constraint() {
    let pool = init_database("sqlite::memory:").await.unwrap();

    sqlx::query("INSERT INTO songs (title, artist, album) VALUES ('A', 'B', '')")
        .execute(&pool)
        .await
        .unwrap();

    let result = sqlx::query(
        "INSERT INTO ratings (song_id, user_identifier, rating_type, created_at) VALUES (1, 'x', 'sideways', '2024-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "Only 'up' and 'down' may be stored");
}

#[tokio::test]
async fn test_second_writer_sees_lock_contention() {
    let dir = TempDir::new().unwrap();
    let (url, _pool) = file_database(&dir).await;

    let options = SqliteConnectOptions::from_str(&url)
        .unwrap()
        .busy_timeout(Duration::ZERO);
    let mut holder = SqliteConnection::connect_with(&options).await.unwrap();
    let mut waiter = SqliteConnection::connect_with(&options).await.unwrap();

    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut holder)
        .await
        .unwrap();

    let err: Error = sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut waiter)
        .await
        .unwrap_err()
        .into();

    assert!(err.is_lock_contention(), "unexpected error: {}", err);
    assert!(!err.is_unique_violation());

    sqlx::query("ROLLBACK").execute(&mut holder).await.unwrap();
}
