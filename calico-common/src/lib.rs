//! # Calico Common Library
//!
//! Shared code for the Radio Calico backend:
//! - Error taxonomy
//! - Bootstrap configuration loading
//! - Database initialization and record types
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
