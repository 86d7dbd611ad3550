//! Track enrichment
//!
//! Attaches a stable song id and live rating counts to each track reported
//! by the station. Unseen (title, artist) pairs are registered on the way.

use calico_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{rating_counts, resolve_song};
use crate::services::metadata_client::TrackInfo;

/// Station track with its song identity and current ratings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedTrack {
    pub song_id: i64,
    #[serde(flatten)]
    pub track: TrackInfo,
    pub thumbs_up: i64,
    pub thumbs_down: i64,
}

/// Resolve one track and read its counts
///
/// The returned fields echo the track as reported, not the stored song, so
/// a later album spelling is shown even though the first-seen album is kept.
pub async fn enrich_track(pool: &SqlitePool, track: &TrackInfo) -> Result<EnrichedTrack> {
    let (song, _created) = resolve_song(pool, &track.title, &track.artist, Some(&track.album)).await?;
    let counts = rating_counts(pool, song.id).await?;

    Ok(EnrichedTrack {
        song_id: song.id,
        track: track.clone(),
        thumbs_up: counts.thumbs_up,
        thumbs_down: counts.thumbs_down,
    })
}

/// Enrich tracks one after another, preserving input order
pub async fn enrich_tracks(pool: &SqlitePool, tracks: &[TrackInfo]) -> Result<Vec<EnrichedTrack>> {
    let mut enriched = Vec::with_capacity(tracks.len());
    for track in tracks {
        enriched.push(enrich_track(pool, track).await?);
    }
    Ok(enriched)
}
