//! Rating ledger and aggregation
//!
//! One row per (song, listener). A repeat vote either leaves the row alone
//! (same polarity) or overwrites its polarity and timestamp (changed
//! polarity). Counts are computed from the ledger on every read.

use calico_common::db::{Rating, RatingCounts, RatingType, SongSummary};
use calico_common::{time, Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::songs::get_song;

const MAX_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF: Duration = Duration::from_millis(10);
const MAX_BACKOFF: Duration = Duration::from_millis(200);

/// Outcome of a rating submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitStatus {
    /// First vote from this listener for this song
    Created,
    /// Listener changed polarity
    Updated,
    /// Listener repeated their current vote
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct RatingSubmission {
    pub rating: Rating,
    pub status: SubmitStatus,
}

impl RatingSubmission {
    /// True only when an existing rating's value was changed
    pub fn updated(&self) -> bool {
        self.status == SubmitStatus::Updated
    }
}

/// Record `listener`'s vote on `song_id`
///
/// Fails with `InvalidInput` for an empty listener identifier and
/// `NotFound` for an unknown song. The read-modify-write runs in one
/// immediate transaction; an error drops the transaction, rolling it back.
pub async fn submit_rating(
    pool: &SqlitePool,
    song_id: i64,
    listener: &str,
    rating_type: RatingType,
) -> Result<RatingSubmission> {
    if listener.is_empty() {
        return Err(Error::InvalidInput(
            "user_identifier and rating_type are required".to_string(),
        ));
    }

    if get_song(pool, song_id).await?.is_none() {
        return Err(Error::NotFound("Song not found".to_string()));
    }

    // A concurrent first vote from the same listener can beat our insert;
    // the next pass then sees that row as existing. Lock contention that
    // outlasts the busy timeout is retried after a short backoff.
    let mut backoff = INITIAL_BACKOFF;
    for attempt in 1..=MAX_ATTEMPTS {
        match try_submit(pool, song_id, listener, rating_type).await {
            Err(err) if err.is_unique_violation() => {
                debug!(song_id, listener, attempt, "Lost rating creation race, retrying");
            }
            Err(err) if err.is_lock_contention() => {
                warn!(
                    song_id,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Database locked, will retry after backoff"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            outcome => return outcome,
        }
    }

    Err(Error::Internal(format!(
        "Rating for song {} still conflicting after {} attempts",
        song_id, MAX_ATTEMPTS
    )))
}

async fn try_submit(
    pool: &SqlitePool,
    song_id: i64,
    listener: &str,
    rating_type: RatingType,
) -> Result<RatingSubmission> {
    // Take the write lock before reading so the later write never has to
    // upgrade a stale read snapshot.
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    let existing = sqlx::query_as::<_, Rating>(
        r#"
        SELECT id, song_id, user_identifier, rating_type, created_at
        FROM ratings
        WHERE song_id = ? AND user_identifier = ?
        "#,
    )
    .bind(song_id)
    .bind(listener)
    .fetch_optional(&mut *tx)
    .await?;

    let submission = match existing {
        Some(rating) if rating.rating_type == rating_type => RatingSubmission {
            rating,
            status: SubmitStatus::Unchanged,
        },
        Some(rating) => {
            let rating = sqlx::query_as::<_, Rating>(
                r#"
                UPDATE ratings
                SET rating_type = ?, created_at = ?
                WHERE id = ?
                RETURNING id, song_id, user_identifier, rating_type, created_at
                "#,
            )
            .bind(rating_type.as_str())
            .bind(time::now_rfc3339())
            .bind(rating.id)
            .fetch_one(&mut *tx)
            .await?;

            RatingSubmission {
                rating,
                status: SubmitStatus::Updated,
            }
        }
        None => {
            let rating = sqlx::query_as::<_, Rating>(
                r#"
                INSERT INTO ratings (song_id, user_identifier, rating_type, created_at)
                VALUES (?, ?, ?, ?)
                RETURNING id, song_id, user_identifier, rating_type, created_at
                "#,
            )
            .bind(song_id)
            .bind(listener)
            .bind(rating_type.as_str())
            .bind(time::now_rfc3339())
            .fetch_one(&mut *tx)
            .await?;

            RatingSubmission {
                rating,
                status: SubmitStatus::Created,
            }
        }
    };

    tx.commit().await?;

    info!(
        song_id,
        rating = %rating_type,
        status = ?submission.status,
        "Rating submitted"
    );

    Ok(submission)
}

/// Current vote of `listener` on `song_id`, if any. Never creates state.
pub async fn lookup_rating(
    pool: &SqlitePool,
    song_id: i64,
    listener: &str,
) -> Result<Option<RatingType>> {
    let value: Option<String> = sqlx::query_scalar(
        "SELECT rating_type FROM ratings WHERE song_id = ? AND user_identifier = ?",
    )
    .bind(song_id)
    .bind(listener)
    .fetch_optional(pool)
    .await?;

    value.map(|v| v.parse()).transpose()
}

/// Thumbs-up/down totals for a song; zero for songs with no votes or unknown ids
pub async fn rating_counts(pool: &SqlitePool, song_id: i64) -> Result<RatingCounts> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT rating_type, COUNT(*) FROM ratings WHERE song_id = ? GROUP BY rating_type",
    )
    .bind(song_id)
    .fetch_all(pool)
    .await?;

    let mut counts = RatingCounts::default();
    for (rating_type, count) in rows {
        match rating_type.parse::<RatingType>()? {
            RatingType::Up => counts.thumbs_up = count,
            RatingType::Down => counts.thumbs_down = count,
        }
    }

    Ok(counts)
}

/// Song with live counts; `NotFound` for an unknown id
pub async fn song_summary(pool: &SqlitePool, song_id: i64) -> Result<SongSummary> {
    let song = get_song(pool, song_id)
        .await?
        .ok_or_else(|| Error::NotFound("Song not found".to_string()))?;
    let counts = rating_counts(pool, song_id).await?;

    Ok(SongSummary { song, counts })
}
