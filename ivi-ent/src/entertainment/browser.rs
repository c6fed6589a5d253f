//! Read-only artist and album lookup

use crate::error::{Error, Result};
use async_trait::async_trait;
use ivi_common::{Album, Artist, Catalog};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait Browser: Send + Sync {
    async fn album_by_id(&self, id: u32) -> Result<Album>;

    async fn artist_by(&self, id: u32) -> Result<Artist>;

    /// Every artist, sorted by id
    async fn all_artists(&self) -> Vec<Artist>;

    /// Every album, sorted by id
    async fn all_albums(&self) -> Vec<Album>;
}

pub struct CatalogBrowser {
    artists: Arc<BTreeMap<u32, Artist>>,
    albums: Arc<BTreeMap<u32, Album>>,
    lookup_delay: Duration,
}

impl CatalogBrowser {
    pub fn new(catalog: &Catalog, lookup_delay: Duration) -> Self {
        Self {
            artists: Arc::new(catalog.artists().clone()),
            albums: Arc::new(catalog.albums().clone()),
            lookup_delay,
        }
    }

    async fn lookup<T: Clone + Send + Sync>(&self, table: &BTreeMap<u32, T>, kind: &str, id: u32) -> Result<T> {
        let record = table
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{} {} not found", kind, id)))?;
        tokio::time::sleep(self.lookup_delay).await;
        debug!("Resolved {} {}", kind, id);
        Ok(record)
    }
}

#[async_trait]
impl Browser for CatalogBrowser {
    async fn album_by_id(&self, id: u32) -> Result<Album> {
        self.lookup(&self.albums, "album", id).await
    }

    async fn artist_by(&self, id: u32) -> Result<Artist> {
        self.lookup(&self.artists, "artist", id).await
    }

    async fn all_artists(&self) -> Vec<Artist> {
        self.artists.values().cloned().collect()
    }

    async fn all_albums(&self) -> Vec<Album> {
        self.albums.values().cloned().collect()
    }
}
