//! Entertainment data model
//!
//! Audio routing enums plus the immutable media records loaded once at startup.
//! All records serialize with camelCase field names to match the media files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Audio path that can feed the shared speaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connection {
    Usb,
    Cd,
    Radio,
}

impl Connection {
    /// Every connection, in a stable order
    pub const ALL: [Connection; 3] = [Connection::Usb, Connection::Cd, Connection::Radio];

    /// Position of this connection in [`Connection::ALL`]
    pub fn index(self) -> usize {
        match self {
            Connection::Usb => 0,
            Connection::Cd => 1,
            Connection::Radio => 2,
        }
    }

    /// Lowercase name used in URIs
    pub fn as_str(self) -> &'static str {
        match self {
            Connection::Usb => "usb",
            Connection::Cd => "cd",
            Connection::Radio => "radio",
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::Usb => write!(f, "USB"),
            Connection::Cd => write!(f, "CD"),
            Connection::Radio => write!(f, "RADIO"),
        }
    }
}

impl FromStr for Connection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "usb" => Ok(Connection::Usb),
            "cd" => Ok(Connection::Cd),
            "radio" | "fm" => Ok(Connection::Radio),
            other => Err(format!("unknown connection '{}'", other)),
        }
    }
}

/// State of one audio connection
///
/// Cycles STOPPED → STARTING → STARTED → STOPPING → STOPPED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AudioState {
    #[default]
    Stopped,
    Starting,
    Started,
    Stopping,
}

impl fmt::Display for AudioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioState::Stopped => write!(f, "STOPPED"),
            AudioState::Starting => write!(f, "STARTING"),
            AudioState::Started => write!(f, "STARTED"),
            AudioState::Stopping => write!(f, "STOPPING"),
        }
    }
}

/// A playable track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: u32,
    pub album_id: u32,
    pub artist_id: u32,
    pub title: String,
    /// Length in seconds
    #[serde(rename = "duration")]
    pub duration_seconds: u32,
}

/// A radio station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: u32,
    pub name: String,
}

/// Album record with cover art URLs in several sizes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: u32,
    pub name: String,
    pub artist_id: u32,
    pub cover: String,
    pub cover_small: String,
    pub cover_medium: String,
    pub cover_big: String,
    pub cover_xl: String,
}
