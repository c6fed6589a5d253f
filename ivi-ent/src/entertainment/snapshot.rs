//! Denormalized read models pushed to clients

use ivi_common::{AudioState, Connection, Station, Track};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub name: String,
    pub is_playing: bool,
    pub now_playing_index: usize,
    /// `None` when the index is outside the track list
    pub current_track: Option<Track>,
    /// Seconds; 0 without a current track
    pub duration: u32,
    pub tracks: String,
    pub rpc: String,
}

impl PlayerSnapshot {
    pub fn new(name: &str, is_playing: bool, index: usize, tracks: &[Track]) -> Self {
        let current_track = tracks.get(index).cloned();
        Self {
            name: name.to_string(),
            is_playing,
            now_playing_index: index,
            duration: current_track.as_ref().map_or(0, |t| t.duration_seconds),
            current_track,
            tracks: format!("/players/{}/tracks", name),
            rpc: format!("/players/{}/rpc", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TunerSnapshot {
    pub name: String,
    pub station_index: usize,
    pub current_station: Option<Station>,
    /// Latest radio text
    pub current_track: Option<Track>,
    pub stations: String,
    pub rpc: String,
}

impl TunerSnapshot {
    pub fn new(name: &str, index: usize, stations: &[Station], radio_text: Option<Track>) -> Self {
        Self {
            name: name.to_string(),
            station_index: index,
            current_station: stations.get(index).cloned(),
            current_track: radio_text,
            stations: format!("/tuners/{}/stations", name),
            rpc: format!("/tuners/{}/rpc", name),
        }
    }
}

/// State of one audio connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioStatus {
    pub connection: Connection,
    pub state: AudioState,
}
