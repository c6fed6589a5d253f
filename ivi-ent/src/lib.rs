//! Entertainment core for the in-vehicle infotainment service
//!
//! Audio connection routing, USB and CD media players, an FM tuner and a catalog
//! browser, composed by [`EntertainmentFacade`] and exposed over HTTP/WebSocket by
//! the [`api`] module.

pub mod api;
pub mod config;
pub mod entertainment;
pub mod error;
pub mod live;
pub mod scheduler;

pub use entertainment::EntertainmentFacade;
pub use error::{Error, Result};
