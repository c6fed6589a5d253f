//! Media catalog loading
//!
//! Decodes the four media tables once at startup. A missing or malformed file is
//! reported as [`Error::Catalog`] and is expected to abort startup.
//!
//! Tables live in the media folder:
//! - `tracks.json`: object keyed by string id, values are tracks (file order is kept)
//! - `artists.json` / `albums.json`: object keyed by integer-valued string id
//! - `stations.json`: array of stations

use crate::model::{Album, Artist, Station, Track};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

pub const TRACKS_FILE: &str = "tracks.json";
pub const ARTISTS_FILE: &str = "artists.json";
pub const ALBUMS_FILE: &str = "albums.json";
pub const STATIONS_FILE: &str = "stations.json";

/// Immutable media tables
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracks: Vec<Track>,
    artists: BTreeMap<u32, Artist>,
    albums: BTreeMap<u32, Album>,
    stations: Vec<Station>,
}

impl Catalog {
    /// Build a catalog from in-memory records
    ///
    /// Artists and albums are keyed by their own `id`.
    pub fn new(
        tracks: Vec<Track>,
        artists: impl IntoIterator<Item = Artist>,
        albums: impl IntoIterator<Item = Album>,
        stations: Vec<Station>,
    ) -> Self {
        Self {
            tracks,
            artists: artists.into_iter().map(|a| (a.id, a)).collect(),
            albums: albums.into_iter().map(|a| (a.id, a)).collect(),
            stations,
        }
    }

    /// Load all tables from `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        info!("Loading media catalog from {}", dir.display());

        let tracks = read_keyed::<Track>(dir, TRACKS_FILE)?
            .into_iter()
            .map(|(_, track)| track)
            .collect::<Vec<_>>();
        let artists = int_keyed(read_keyed::<Artist>(dir, ARTISTS_FILE)?, ARTISTS_FILE)?;
        let albums = int_keyed(read_keyed::<Album>(dir, ALBUMS_FILE)?, ALBUMS_FILE)?;
        let stations = read_list::<Station>(dir, STATIONS_FILE)?;

        info!(
            "Catalog loaded: {} tracks, {} artists, {} albums, {} stations",
            tracks.len(),
            artists.len(),
            albums.len(),
            stations.len()
        );

        Ok(Self {
            tracks,
            artists,
            albums,
            stations,
        })
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn artists(&self) -> &BTreeMap<u32, Artist> {
        &self.artists
    }

    pub fn albums(&self) -> &BTreeMap<u32, Album> {
        &self.albums
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }
}

fn read_file(dir: &Path, file: &str) -> Result<String> {
    let path = dir.join(file);
    std::fs::read_to_string(&path)
        .map_err(|e| Error::Catalog(format!("cannot read {}: {}", path.display(), e)))
}

/// Decode an object table, keeping the key order of the file
fn read_keyed<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<(String, T)>> {
    let content = read_file(dir, file)?;
    let table: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
        .map_err(|e| Error::Catalog(format!("{}: {}", file, e)))?;

    let mut entries = Vec::with_capacity(table.len());
    for (key, value) in table {
        let record = serde_json::from_value::<T>(value)
            .map_err(|e| Error::Catalog(format!("{}: entry '{}': {}", file, key, e)))?;
        entries.push((key, record));
    }
    debug!("Decoded {} entries from {}", entries.len(), file);
    Ok(entries)
}

fn read_list<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>> {
    let content = read_file(dir, file)?;
    let list: Vec<T> =
        serde_json::from_str(&content).map_err(|e| Error::Catalog(format!("{}: {}", file, e)))?;
    debug!("Decoded {} entries from {}", list.len(), file);
    Ok(list)
}

fn int_keyed<T>(entries: Vec<(String, T)>, file: &str) -> Result<BTreeMap<u32, T>> {
    entries
        .into_iter()
        .map(|(key, record)| {
            key.parse::<u32>()
                .map(|id| (id, record))
                .map_err(|_| Error::Catalog(format!("{}: key '{}' is not an integer id", file, key)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keys_by_record_id() {
        let catalog = Catalog::new(
            vec![],
            vec![
                Artist { id: 9, name: "Kendrick Lamar".to_string() },
                Artist { id: 2, name: "Fetty Wap".to_string() },
            ],
            vec![],
            vec![],
        );

        let ids: Vec<u32> = catalog.artists().keys().copied().collect();
        assert_eq!(ids, vec![2, 9]);
        assert_eq!(catalog.artists()[&9].name, "Kendrick Lamar");
    }

    #[test]
    fn test_int_keyed_rejects_text_keys() {
        let entries = vec![("one".to_string(), 1u8)];
        let result = int_keyed(entries, ARTISTS_FILE);
        assert!(matches!(result, Err(Error::Catalog(_))));
    }
}
