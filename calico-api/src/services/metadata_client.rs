//! Station metadata client
//!
//! Fetches now-playing and recently-played data from the station's public
//! endpoints. Remote failures never reach the caller:
//! - `current_track` degrades to a static placeholder track
//! - `history` walks an ordered candidate list, then degrades to a built-in
//!   sample list

use calico_common::config::MetadataConfig;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("calico-api/", env!("CARGO_PKG_VERSION"));

pub const UNKNOWN_TITLE: &str = "Unknown Track";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Album art served by the frontend when the live endpoint is unreachable
pub const FALLBACK_ART_PATH: &str = "/images/RadioCalicoLayout.png";

/// Metadata client errors. Logged and absorbed, never returned to handlers.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Unexpected response shape: {0}")]
    Shape(&'static str),
}

/// One remote endpoint with its own request timeout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

/// A track as reported by the station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    #[serde(rename = "playedAt", default, skip_serializing_if = "Option::is_none")]
    pub played_at: Option<String>,
}

impl TrackInfo {
    pub fn new(title: &str, artist: &str, album: &str, played_at: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            played_at: played_at.map(str::to_string),
        }
    }

    /// Read a track from a JSON object, substituting sentinels for absent fields
    ///
    /// Returns `None` if `value` is not an object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| object.get(key).and_then(Value::as_str);

        Some(Self::new(
            text("title").unwrap_or(UNKNOWN_TITLE),
            text("artist").unwrap_or(UNKNOWN_ARTIST),
            text("album").unwrap_or(""),
            text("playedAt"),
        ))
    }
}

/// Stream technical details reported alongside live metadata
///
/// Fields the station leaves out are kept as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamFormat {
    pub bit_depth: Value,
    pub sample_rate: Value,
}

/// Current track plus live-stream extras
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub track: TrackInfo,
    pub album_art: String,
    pub live: bool,
    /// Present only when the track came from the live endpoint
    pub format: Option<StreamFormat>,
}

impl NowPlaying {
    /// Static track shown while the live endpoint is unavailable
    pub fn placeholder() -> Self {
        Self {
            track: TrackInfo::new("Radio Calico", "Live Stream", "24/7 Music", None),
            album_art: FALLBACK_ART_PATH.to_string(),
            live: true,
            format: None,
        }
    }
}

/// HTTP client for the station's metadata endpoints
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http_client: reqwest::Client,
    now_playing: Endpoint,
    history: Vec<Endpoint>,
    album_art_url: String,
}

impl MetadataClient {
    pub fn new(
        now_playing: Endpoint,
        history: Vec<Endpoint>,
        album_art_url: impl Into<String>,
    ) -> Result<Self, MetadataError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http_client,
            now_playing,
            history,
            album_art_url: album_art_url.into(),
        })
    }

    /// Build a client where every endpoint shares the configured timeout
    pub fn from_config(config: &MetadataConfig) -> Result<Self, MetadataError> {
        let timeout = config.timeout();
        let history = config
            .history_urls
            .iter()
            .map(|url| Endpoint::new(url.as_str(), timeout))
            .collect();

        Self::new(
            Endpoint::new(config.now_playing_url.as_str(), timeout),
            history,
            config.album_art_url.as_str(),
        )
    }

    /// Currently playing track; the placeholder track on any failure
    pub async fn current_track(&self) -> NowPlaying {
        match self.fetch_now_playing().await {
            Ok(now_playing) => now_playing,
            Err(e) => {
                warn!(url = %self.now_playing.url, "Now playing unavailable, using placeholder: {}", e);
                NowPlaying::placeholder()
            }
        }
    }

    async fn fetch_now_playing(&self) -> Result<NowPlaying, MetadataError> {
        let body = self.fetch_json(&self.now_playing).await?;
        let track = TrackInfo::from_json(&body)
            .ok_or(MetadataError::Shape("now playing body is not an object"))?;
        let extra = |key: &str| body.get(key).cloned().unwrap_or(Value::Null);

        Ok(NowPlaying {
            track: TrackInfo {
                played_at: None,
                ..track
            },
            album_art: self.album_art_url.clone(),
            live: true,
            format: Some(StreamFormat {
                bit_depth: extra("bit_depth"),
                sample_rate: extra("sample_rate"),
            }),
        })
    }

    /// Recently played tracks from the first candidate that answers with a
    /// track list; the built-in sample list if none does
    ///
    /// An empty list still ends the search: the station answered, it just
    /// has nothing to report, so the sample list stands in.
    pub async fn history(&self) -> Vec<TrackInfo> {
        for endpoint in &self.history {
            match self.fetch_history(endpoint).await {
                Ok(tracks) if tracks.is_empty() => {
                    info!(
                        url = %endpoint.url,
                        "History endpoint returned no tracks, using sample history"
                    );
                    return sample_history();
                }
                Ok(tracks) => {
                    info!(url = %endpoint.url, count = tracks.len(), "Fetched track history");
                    return tracks;
                }
                Err(e) => {
                    debug!(url = %endpoint.url, "History candidate failed: {}", e);
                }
            }
        }

        warn!(
            candidates = self.history.len(),
            "No history endpoint available, using sample history"
        );
        sample_history()
    }

    async fn fetch_history(&self, endpoint: &Endpoint) -> Result<Vec<TrackInfo>, MetadataError> {
        let body = self.fetch_json(endpoint).await?;
        parse_track_list(body)
    }

    async fn fetch_json(&self, endpoint: &Endpoint) -> Result<Value, MetadataError> {
        let response = self
            .http_client
            .get(&endpoint.url)
            .timeout(endpoint.timeout)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(MetadataError::Status(response.status().as_u16()));
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Normalize a history body: either a bare list of tracks or `{"tracks": [...]}`
///
/// Lists holding non-object entries are rejected so the caller moves on to
/// the next candidate. An empty list is returned as is.
pub fn parse_track_list(body: Value) -> Result<Vec<TrackInfo>, MetadataError> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("tracks") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(MetadataError::Shape("object without a tracks list")),
        },
        _ => return Err(MetadataError::Shape("neither a list nor an object")),
    };

    entries
        .iter()
        .map(|entry| TrackInfo::from_json(entry).ok_or(MetadataError::Shape("track entry is not an object")))
        .collect()
}

/// Built-in history served when every candidate endpoint fails
pub fn sample_history() -> Vec<TrackInfo> {
    vec![
        TrackInfo::new(
            "He's A Dream (1983)",
            "Shandi Sinnamon",
            "Flashdance (Original Motion Picture Soundtrack)",
            Some("2024-11-04T18:30:00Z"),
        ),
        TrackInfo::new(
            "Ain't 2 Proud 2 Beg",
            "TLC",
            "Ooooooohhh... On the TLC Tip",
            Some("2024-11-04T18:26:00Z"),
        ),
        TrackInfo::new(
            "Steady, As She Goes",
            "The Raconteurs",
            "Broken Boy Soldiers",
            Some("2024-11-04T18:22:00Z"),
        ),
        TrackInfo::new(
            "Just Another Night",
            "Mick Jagger",
            "She's the Boss",
            Some("2024-11-04T18:18:00Z"),
        ),
        TrackInfo::new(
            "Irreplaceable (Album Version)",
            "Beyoncé",
            "B'Day",
            Some("2024-11-04T18:14:00Z"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_track_defaults_for_missing_fields() {
        let track = TrackInfo::from_json(&json!({ "album": null })).unwrap();
        assert_eq!(track.title, UNKNOWN_TITLE);
        assert_eq!(track.artist, UNKNOWN_ARTIST);
        assert_eq!(track.album, "");
        assert_eq!(track.played_at, None);

        assert!(TrackInfo::from_json(&json!("not a track")).is_none());
    }

    #[test]
    fn test_both_history_shapes_normalize_identically() {
        let entries = json!([
            { "title": "T1", "artist": "A1", "album": "L1", "playedAt": "2024-01-01T00:00:00Z" },
            { "title": "T2", "artist": "A2" }
        ]);

        let bare = parse_track_list(entries.clone()).unwrap();
        let wrapped = parse_track_list(json!({ "tracks": entries })).unwrap();

        assert_eq!(bare, wrapped);
        assert_eq!(bare.len(), 2);
        assert_eq!(bare[0].played_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(bare[1].album, "");
    }

    #[test]
    fn test_malformed_history_bodies_rejected() {
        assert!(parse_track_list(json!({ "items": [] })).is_err());
        assert!(parse_track_list(json!({ "tracks": "nope" })).is_err());
        assert!(parse_track_list(json!([1, 2])).is_err());
        assert!(parse_track_list(json!("tracks")).is_err());
    }

    #[test]
    fn test_empty_history_bodies_parse_to_no_tracks() {
        assert!(parse_track_list(json!([])).unwrap().is_empty());
        assert!(parse_track_list(json!({ "tracks": [] })).unwrap().is_empty());
    }

    #[test]
    fn test_sample_history_has_five_tracks() {
        let samples = sample_history();
        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|t| t.played_at.is_some()));
    }

    #[test]
    fn test_placeholder_track() {
        let placeholder = NowPlaying::placeholder();
        assert_eq!(placeholder.track.title, "Radio Calico");
        assert_eq!(placeholder.track.artist, "Live Stream");
        assert_eq!(placeholder.track.album, "24/7 Music");
        assert_eq!(placeholder.album_art, FALLBACK_ART_PATH);
        assert!(placeholder.live);
        assert!(placeholder.format.is_none());
    }

    #[test]
    fn test_from_config_applies_timeout_to_every_endpoint() {
        let config = MetadataConfig {
            timeout_secs: 3,
            ..MetadataConfig::default()
        };
        let client = MetadataClient::from_config(&config).unwrap();

        assert_eq!(client.history.len(), config.history_urls.len());
        assert!(client
            .history
            .iter()
            .all(|e| e.timeout == Duration::from_secs(3)));
        assert_eq!(client.now_playing.url, config.now_playing_url);
    }
}
