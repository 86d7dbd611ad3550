//! Services: remote metadata access and track enrichment

pub mod enrichment;
pub mod metadata_client;
pub mod probe;

pub use enrichment::{enrich_track, enrich_tracks, EnrichedTrack};
pub use metadata_client::{Endpoint, MetadataClient, NowPlaying, StreamFormat, TrackInfo};
