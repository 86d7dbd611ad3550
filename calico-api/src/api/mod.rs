//! HTTP API handlers for calico-api

pub mod health;
pub mod posts;
pub mod radio;
pub mod songs;
pub mod users;

pub use health::health_routes;
pub use posts::post_routes;
pub use radio::radio_routes;
pub use songs::song_routes;
pub use users::user_routes;
