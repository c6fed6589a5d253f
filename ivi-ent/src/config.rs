//! Configuration for the entertainment service
//!
//! Two layers:
//! 1. **TOML bootstrap** ([`TomlConfig`]): port, media folder, logging and the
//!    simulated hardware timings. Every field has a built-in default, so an empty
//!    or missing file is valid.
//! 2. **Runtime** ([`EntertainmentConfig`]): the plain values the facade is built
//!    from, derived from the TOML layer or constructed directly in tests.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP/WebSocket gateway port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Folder holding tracks.json, artists.json, albums.json and stations.json
    #[serde(default)]
    pub media_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub players: PlayersConfig,

    #[serde(default)]
    pub radio: RadioConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            media_folder: None,
            logging: LoggingConfig::default(),
            timing: TimingConfig::default(),
            players: PlayersConfig::default(),
            radio: RadioConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Simulated hardware timings, in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Audio connection handshake (STARTING → STARTED, STOPPING → STOPPED)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Player play/pause/select
    #[serde(default = "default_command_delay_ms")]
    pub command_delay_ms: u64,

    /// Player track list fetch
    #[serde(default = "default_list_delay_ms")]
    pub list_delay_ms: u64,

    /// Single artist/album lookup
    #[serde(default = "default_lookup_delay_ms")]
    pub lookup_delay_ms: u64,

    /// Volume ramp for fade in/out
    #[serde(default = "default_fade_ramp_ms")]
    pub fade_ramp_ms: u64,

    /// Radio text refresh period
    #[serde(default = "default_radio_text_interval_ms")]
    pub radio_text_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            command_delay_ms: default_command_delay_ms(),
            list_delay_ms: default_list_delay_ms(),
            lookup_delay_ms: default_lookup_delay_ms(),
            fade_ramp_ms: default_fade_ramp_ms(),
            radio_text_interval_ms: default_radio_text_interval_ms(),
        }
    }
}

/// Half-open `[from, to)` slice of the catalog track list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TrackRange {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayersConfig {
    /// Refuse `play` unless the player's audio connection is STARTED
    #[serde(default = "default_true")]
    pub check_audio: bool,

    /// Tracks visible to the CD player
    #[serde(default = "default_cd_tracks")]
    pub cd_tracks: Option<TrackRange>,
}

impl Default for PlayersConfig {
    fn default() -> Self {
        Self {
            check_audio: true,
            cd_tracks: default_cd_tracks(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RadioConfig {
    /// Seed for a reproducible radio text sequence
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_port() -> u16 {
    7780
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_command_delay_ms() -> u64 {
    500
}

fn default_list_delay_ms() -> u64 {
    100
}

fn default_lookup_delay_ms() -> u64 {
    100
}

fn default_fade_ramp_ms() -> u64 {
    1
}

fn default_radio_text_interval_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_cd_tracks() -> Option<TrackRange> {
    Some(TrackRange { from: 400, to: 450 })
}

/// Runtime settings consumed by `EntertainmentFacade::new`
#[derive(Debug, Clone)]
pub struct EntertainmentConfig {
    pub settle_delay: Duration,
    pub fade_ramp: Duration,
    pub command_delay: Duration,
    pub list_delay: Duration,
    pub lookup_delay: Duration,
    pub radio_text_interval: Duration,
    pub check_audio: bool,
    pub cd_tracks: Option<TrackRange>,
    pub radio_seed: Option<u64>,
}

impl Default for EntertainmentConfig {
    fn default() -> Self {
        TomlConfig::default().runtime()
    }
}

impl TomlConfig {
    /// Runtime settings described by this file
    ///
    /// A zero radio text interval is a configuration error: the announcer
    /// needs a period to repeat on.
    pub fn entertainment(&self) -> ivi_common::Result<EntertainmentConfig> {
        if self.timing.radio_text_interval_ms == 0 {
            return Err(ivi_common::Error::Config(
                "timing.radio_text_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(self.runtime())
    }

    fn runtime(&self) -> EntertainmentConfig {
        let t = &self.timing;
        EntertainmentConfig {
            settle_delay: Duration::from_millis(t.settle_ms),
            fade_ramp: Duration::from_millis(t.fade_ramp_ms),
            command_delay: Duration::from_millis(t.command_delay_ms),
            list_delay: Duration::from_millis(t.list_delay_ms),
            lookup_delay: Duration::from_millis(t.lookup_delay_ms),
            radio_text_interval: Duration::from_millis(t.radio_text_interval_ms),
            check_audio: self.players.check_audio,
            cd_tracks: self.players.cd_tracks,
            radio_seed: self.radio.seed,
        }
    }
}
