//! # IVI Common Library
//!
//! Shared code for the infotainment entertainment service:
//! - Data model (connections, audio states, tracks, stations, artists, albums)
//! - Catalog loading from the media folder
//! - Configuration file discovery and media folder resolution

pub mod catalog;
pub mod config;
pub mod error;
pub mod model;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use model::{Album, Artist, AudioState, Connection, Station, Track};
