//! Entertainment domain
//!
//! - [`audio`]: connection state machines and the single-active-connection rule
//! - [`player`]: USB and CD media players
//! - [`radio`]: FM tuner with periodic radio text
//! - [`browser`]: artist and album lookup
//! - [`facade`]: composition of the above, snapshots and subscriptions

pub mod audio;
pub mod browser;
pub mod facade;
pub mod player;
pub mod radio;
pub mod resource;
pub mod rpc;
pub mod snapshot;

pub use audio::{Audio, AudioConnectionManager};
pub use browser::{Browser, CatalogBrowser};
pub use facade::EntertainmentFacade;
pub use player::{Player, PlayerEngine, PlayerSettings};
pub use radio::{Radio, RadioTuner};
pub use resource::{Envelope, PlayerId, Resource, TUNER_NAME};
pub use rpc::{MethodDesc, RpcCall};
pub use snapshot::{AudioStatus, PlayerSnapshot, TunerSnapshot};
