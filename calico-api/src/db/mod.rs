//! Database access for calico-api
//!
//! Repository functions over a shared [`sqlx::SqlitePool`]. Relationships
//! (song → ratings, user → posts) are explicit queries, never lazy loads.

pub mod posts;
pub mod ratings;
pub mod seed;
pub mod songs;
pub mod users;

pub use ratings::{lookup_rating, rating_counts, song_summary, submit_rating, RatingSubmission, SubmitStatus};
pub use songs::{find_song, get_song, resolve_song};
