//! Database models

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: String,
    /// Derived from the posts table at query time
    pub post_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    /// Username of the owning user, joined at query time
    pub author: String,
    pub created_at: String,
}

/// A song identified by its exact (title, artist) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
}

/// Rating polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingType {
    Up,
    Down,
}

impl RatingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingType::Up => "up",
            RatingType::Down => "down",
        }
    }
}

impl fmt::Display for RatingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatingType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "up" => Ok(RatingType::Up),
            "down" => Ok(RatingType::Down),
            _ => Err(Error::InvalidInput(
                "rating_type must be \"up\" or \"down\"".to_string(),
            )),
        }
    }
}

impl TryFrom<String> for RatingType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// One listener's current opinion of one song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Rating {
    pub id: i64,
    pub song_id: i64,
    #[serde(skip_serializing)]
    pub user_identifier: String,
    #[sqlx(try_from = "String")]
    pub rating_type: RatingType,
    pub created_at: String,
}

/// Thumbs-up/down totals, derived from the ratings table on every read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingCounts {
    pub thumbs_up: i64,
    pub thumbs_down: i64,
}

/// Song plus its live rating counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongSummary {
    #[serde(flatten)]
    pub song: Song,
    #[serde(flatten)]
    pub counts: RatingCounts,
}
