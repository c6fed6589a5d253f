//! Addressable resources and subscription envelopes
//!
//! A [`Resource`] is parsed from a gateway URI such as `/players/usb` or
//! `/players/cd/tracks?from=0&to=20`. Live subscriptions deliver each update as an
//! [`Envelope`] tagged with the caller's correlation id.

use crate::error::{Error, Result};
use axum::extract::Query;
use axum::http::Uri;
use ivi_common::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Name of the only tuner
pub const TUNER_NAME: &str = "fm";

/// The two media players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerId {
    Usb,
    Cd,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::Usb, PlayerId::Cd];

    pub fn name(self) -> &'static str {
        match self {
            PlayerId::Usb => "usb",
            PlayerId::Cd => "cd",
        }
    }

    pub fn connection(self) -> Connection {
        match self {
            PlayerId::Usb => Connection::Usb,
            PlayerId::Cd => Connection::Cd,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlayerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "usb" => Ok(PlayerId::Usb),
            // "sd" is what older clients call the disc player
            "cd" | "sd" => Ok(PlayerId::Cd),
            other => Err(Error::NotFound(format!("player '{}' does not exist", other))),
        }
    }
}

/// Fails with `NotFound` for any tuner other than [`TUNER_NAME`]
pub fn check_tuner(name: &str) -> Result<()> {
    if name == TUNER_NAME {
        Ok(())
    } else {
        Err(Error::NotFound(format!("tuner '{}' does not exist", name)))
    }
}

pub fn parse_connection(name: &str) -> Result<Connection> {
    name.parse::<Connection>().map_err(Error::NotFound)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Root,
    Players,
    Player(PlayerId),
    Tracks {
        player: PlayerId,
        from: Option<usize>,
        to: Option<usize>,
    },
    PlayerMethods(PlayerId),
    Tuners,
    Tuner,
    Stations,
    TunerMethods,
    Artists,
    Albums,
    Artist(u32),
    Album(u32),
    Audio,
    AudioConnection(Connection),
    AudioMethods(Connection),
}

/// `?from=&to=` slice of a player's track list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TrackRangeQuery {
    pub from: Option<usize>,
    pub to: Option<usize>,
}

impl TrackRangeQuery {
    /// Decode a raw query string the same way the HTTP `Query` extractor does
    pub fn parse(query: &str) -> Result<Self> {
        if query.is_empty() {
            return Ok(Self::default());
        }
        let uri: Uri = format!("/?{}", query)
            .parse()
            .map_err(|e| Error::IllegalArgument(format!("malformed query '{}': {}", query, e)))?;
        Query::<Self>::try_from_uri(&uri)
            .map(|Query(range)| range)
            .map_err(|rejection| Error::IllegalArgument(rejection.body_text()))
    }
}

impl Resource {
    pub fn parse(uri: &str) -> Result<Self> {
        let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resource = match segments.as_slice() {
            [] => Resource::Root,
            ["players"] => Resource::Players,
            ["players", name] => Resource::Player(name.parse()?),
            ["players", name, "tracks"] => {
                let player = name.parse()?;
                let range = TrackRangeQuery::parse(query)?;
                Resource::Tracks {
                    player,
                    from: range.from,
                    to: range.to,
                }
            }
            ["players", name, "rpc"] => Resource::PlayerMethods(name.parse()?),
            ["tuners"] => Resource::Tuners,
            ["tuners", name] => {
                check_tuner(name)?;
                Resource::Tuner
            }
            ["tuners", name, "stations"] => {
                check_tuner(name)?;
                Resource::Stations
            }
            ["tuners", name, "rpc"] => {
                check_tuner(name)?;
                Resource::TunerMethods
            }
            ["artists"] => Resource::Artists,
            ["artists", id] => Resource::Artist(parse_id(id)?),
            ["albums"] => Resource::Albums,
            ["albums", id] => Resource::Album(parse_id(id)?),
            ["audio"] => Resource::Audio,
            ["audio", name] => Resource::AudioConnection(parse_connection(name)?),
            ["audio", name, "rpc"] => Resource::AudioMethods(parse_connection(name)?),
            _ => return Err(Error::NotFound(format!("{} cannot be handled", uri))),
        };
        Ok(resource)
    }
}

pub fn parse_id(raw: &str) -> Result<u32> {
    raw.parse()
        .map_err(|_| Error::IllegalArgument(format!("'{}' is not a valid id", raw)))
}

/// One pushed update for a subscription
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Set on the final envelope of a failed subscription
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn payload(id: &str, payload: Value) -> Self {
        Self {
            id: id.to_string(),
            payload: Some(payload),
            error: None,
        }
    }

    pub fn error(id: &str, error: &Error) -> Self {
        Self {
            id: id.to_string(),
            payload: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_player_resources() {
        assert_eq!(Resource::parse("/").unwrap(), Resource::Root);
        assert_eq!(Resource::parse("").unwrap(), Resource::Root);
        assert_eq!(Resource::parse("/players").unwrap(), Resource::Players);
        assert_eq!(
            Resource::parse("/players/usb").unwrap(),
            Resource::Player(PlayerId::Usb)
        );
        assert_eq!(
            Resource::parse("/players/sd/rpc").unwrap(),
            Resource::PlayerMethods(PlayerId::Cd)
        );
        assert_eq!(
            Resource::parse("/players/cd/tracks?from=5&to=10").unwrap(),
            Resource::Tracks {
                player: PlayerId::Cd,
                from: Some(5),
                to: Some(10)
            }
        );
        assert_eq!(
            Resource::parse("/players/usb/tracks").unwrap(),
            Resource::Tracks {
                player: PlayerId::Usb,
                from: None,
                to: None
            }
        );
    }

    #[test]
    fn test_parse_other_resources() {
        assert_eq!(Resource::parse("/tuners/fm").unwrap(), Resource::Tuner);
        assert_eq!(Resource::parse("/tuners/fm/stations").unwrap(), Resource::Stations);
        assert_eq!(Resource::parse("/artists/27").unwrap(), Resource::Artist(27));
        assert_eq!(Resource::parse("/albums/").unwrap(), Resource::Albums);
        assert_eq!(
            Resource::parse("/audio/radio").unwrap(),
            Resource::AudioConnection(Connection::Radio)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Resource::parse("/players/tape"), Err(Error::NotFound(_))));
        assert!(matches!(Resource::parse("/tuners/am"), Err(Error::NotFound(_))));
        assert!(matches!(Resource::parse("/videos"), Err(Error::NotFound(_))));
        assert!(matches!(Resource::parse("/artists/abc"), Err(Error::IllegalArgument(_))));
        assert!(matches!(
            Resource::parse("/players/usb/tracks?from=x"),
            Err(Error::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_track_range_query_is_percent_decoded() {
        assert_eq!(
            Resource::parse("/players/usb/tracks?from=%32&to=4").unwrap(),
            Resource::Tracks {
                player: PlayerId::Usb,
                from: Some(2),
                to: Some(4)
            }
        );
        assert_eq!(
            TrackRangeQuery::parse("to=7&unused=x").unwrap(),
            TrackRangeQuery {
                from: None,
                to: Some(7)
            }
        );
        assert!(matches!(
            TrackRangeQuery::parse("from=-1"),
            Err(Error::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_envelope_json() {
        let update = Envelope::payload("sub-1", json!({"isPlaying": true}));
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"id": "sub-1", "payload": {"isPlaying": true}})
        );

        let failed = Envelope::error("sub-1", &Error::NotFound("artist 9 not found".to_string()));
        assert!(failed.is_error());
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"id": "sub-1", "error": "Not found: artist 9 not found"})
        );
    }
}
