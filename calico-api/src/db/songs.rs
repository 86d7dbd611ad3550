//! Song identity store
//!
//! Maps an exact (title, artist) pair to a single `songs` row. Strings are
//! compared byte-for-byte: no trimming or case folding happens here, so
//! callers must pass the same strings they want to match later.

use calico_common::db::Song;
use calico_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Load song by id
pub async fn get_song(pool: &SqlitePool, song_id: i64) -> Result<Option<Song>> {
    let song = sqlx::query_as::<_, Song>("SELECT id, title, artist, album FROM songs WHERE id = ?")
        .bind(song_id)
        .fetch_optional(pool)
        .await?;

    Ok(song)
}

/// Load song by exact (title, artist)
pub async fn find_song(pool: &SqlitePool, title: &str, artist: &str) -> Result<Option<Song>> {
    let song = sqlx::query_as::<_, Song>(
        "SELECT id, title, artist, album FROM songs WHERE title = ? AND artist = ?",
    )
    .bind(title)
    .bind(artist)
    .fetch_optional(pool)
    .await?;

    Ok(song)
}

/// Find the song for (title, artist), creating it if unseen
///
/// Returns the song and whether this call created it. An existing song is
/// returned untouched: the album of the first sighting is kept even when a
/// different `album` is supplied.
///
/// Concurrent callers may both miss the lookup and race on the insert; the
/// UNIQUE(title, artist) constraint rejects the loser, which then re-reads
/// the winner's row and reports `created = false`.
pub async fn resolve_song(
    pool: &SqlitePool,
    title: &str,
    artist: &str,
    album: Option<&str>,
) -> Result<(Song, bool)> {
    if let Some(song) = find_song(pool, title, artist).await? {
        return Ok((song, false));
    }

    let inserted = sqlx::query_as::<_, Song>(
        r#"
        INSERT INTO songs (title, artist, album)
        VALUES (?, ?, ?)
        RETURNING id, title, artist, album
        "#,
    )
    .bind(title)
    .bind(artist)
    .bind(album.unwrap_or(""))
    .fetch_one(pool)
    .await
    .map_err(Error::from);

    match inserted {
        Ok(song) => {
            info!(song_id = song.id, title, artist, "Created song");
            Ok((song, true))
        }
        Err(err) if err.is_unique_violation() => {
            debug!(title, artist, "Lost song creation race, re-reading");
            let song = find_song(pool, title, artist).await?.ok_or_else(|| {
                Error::Internal(format!(
                    "Song '{}' by '{}' vanished after unique violation",
                    title, artist
                ))
            })?;
            Ok((song, false))
        }
        Err(err) => Err(err),
    }
}
