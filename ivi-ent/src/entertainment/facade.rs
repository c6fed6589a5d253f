//! Single API surface over audio, players, tuner and browser
//!
//! Built once at startup. Every component shares one [`SerialScheduler`], so
//! audio, player and tuner transitions are totally ordered.

use super::audio::{Audio, AudioConnectionManager};
use super::browser::{Browser, CatalogBrowser};
use super::player::{Player, PlayerEngine, PlayerSettings};
use super::radio::{Radio, RadioTuner};
use super::resource::{Envelope, PlayerId, Resource, TUNER_NAME};
use super::rpc::{AudioCommand, MethodDesc, PlayerCommand, RpcCall, TunerCommand};
use super::snapshot::{AudioStatus, PlayerSnapshot, TunerSnapshot};
use crate::config::EntertainmentConfig;
use crate::error::{Error, Result};
use crate::live::{combine_latest2, combine_latest_all, current, LiveStream};
use crate::scheduler::SerialScheduler;
use futures::stream::{self, BoxStream, StreamExt};
use futures::Future;
use ivi_common::{Album, Artist, Catalog, Connection, Station, Track};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub struct EntertainmentFacade {
    audio: AudioConnectionManager,
    usb: Arc<dyn Player>,
    cd: Arc<dyn Player>,
    fm: Arc<dyn Radio>,
    browser: Arc<dyn Browser>,
}

impl EntertainmentFacade {
    /// Wire up all components. Must be called from within a tokio runtime.
    pub fn new(catalog: &Catalog, config: &EntertainmentConfig) -> Self {
        let scheduler = SerialScheduler::spawn("entertainment");
        let audio =
            AudioConnectionManager::new(scheduler.clone(), config.settle_delay, config.fade_ramp);
        let shared_audio: Arc<dyn Audio> = Arc::new(audio.clone());

        let all_tracks: Arc<[Track]> = Arc::from(catalog.tracks());
        let cd_tracks: Arc<[Track]> = match config.cd_tracks {
            Some(range) => Arc::from(clamped(catalog.tracks(), Some(range.from), Some(range.to))),
            None => Arc::clone(&all_tracks),
        };

        let settings = PlayerSettings {
            command_delay: config.command_delay,
            list_delay: config.list_delay,
            check_audio: config.check_audio,
        };

        let usb = PlayerEngine::new(
            PlayerId::Usb.name(),
            PlayerId::Usb.connection(),
            Arc::clone(&all_tracks),
            Arc::clone(&shared_audio),
            scheduler.clone(),
            settings.clone(),
        );
        let cd = PlayerEngine::new(
            PlayerId::Cd.name(),
            PlayerId::Cd.connection(),
            cd_tracks,
            shared_audio,
            scheduler.clone(),
            settings,
        );
        let fm = RadioTuner::new(
            TUNER_NAME,
            Arc::from(catalog.stations()),
            all_tracks,
            scheduler,
            config.radio_text_interval,
            config.radio_seed,
        );
        let browser = CatalogBrowser::new(catalog, config.lookup_delay);

        info!("Entertainment facade ready");

        Self {
            audio,
            usb: Arc::new(usb),
            cd: Arc::new(cd),
            fm: Arc::new(fm),
            browser: Arc::new(browser),
        }
    }

    pub fn audio(&self) -> &AudioConnectionManager {
        &self.audio
    }

    pub fn player(&self, id: PlayerId) -> &Arc<dyn Player> {
        match id {
            PlayerId::Usb => &self.usb,
            PlayerId::Cd => &self.cd,
        }
    }

    pub fn tuner(&self) -> &Arc<dyn Radio> {
        &self.fm
    }

    pub fn browser(&self) -> &Arc<dyn Browser> {
        &self.browser
    }

    // ========================================================================
    // Players
    // ========================================================================

    /// Live snapshot of one player
    pub fn player_updates(&self, id: PlayerId) -> LiveStream<PlayerSnapshot> {
        let player = Arc::clone(self.player(id));
        Box::pin(async_stream::stream! {
            let tracks = player.list().await;
            let name = player.name().to_string();
            let mut snapshots = combine_latest2(
                player.is_playing(),
                player.now_playing(),
                move |playing, index| PlayerSnapshot::new(&name, *playing, *index, &tracks),
            );
            while let Some(snapshot) = snapshots.next().await {
                yield snapshot;
            }
        })
    }

    pub fn players_updates(&self) -> LiveStream<Vec<PlayerSnapshot>> {
        combine_latest_all(
            PlayerId::ALL
                .iter()
                .map(|id| self.player_updates(*id))
                .collect(),
        )
    }

    pub async fn player_snapshot(&self, id: PlayerId) -> Result<PlayerSnapshot> {
        current(self.player_updates(id)).await
    }

    pub async fn players(&self) -> Result<Vec<PlayerSnapshot>> {
        current(self.players_updates()).await
    }

    /// `[from, to)` of the player's track list, clamped to its bounds
    pub async fn tracks(&self, id: PlayerId, from: Option<usize>, to: Option<usize>) -> Vec<Track> {
        clamped(&self.player(id).list().await, from, to).to_vec()
    }

    /// Run a command and return the snapshot once it has taken effect
    pub async fn invoke_player(&self, id: PlayerId, call: &RpcCall) -> Result<PlayerSnapshot> {
        let command = PlayerCommand::parse(call)?;
        debug!("Player '{}' command {:?}", id, command);

        let player = self.player(id);
        match command {
            PlayerCommand::Select(index) => player.select(index).await?,
            PlayerCommand::Play => player.play().await?,
            PlayerCommand::Pause => player.pause().await?,
        }
        self.player_snapshot(id).await
    }

    pub fn player_methods(&self, id: PlayerId) -> Vec<MethodDesc> {
        PlayerCommand::describe(&format!("/players/{}/rpc", id))
    }

    // ========================================================================
    // Tuner
    // ========================================================================

    pub fn tuner_updates(&self) -> LiveStream<TunerSnapshot> {
        let tuner = Arc::clone(&self.fm);
        Box::pin(async_stream::stream! {
            let stations = tuner.list().await;
            let name = tuner.name().to_string();
            let mut snapshots = combine_latest2(
                tuner.now_playing(),
                tuner.radio_text(),
                move |index, text| TunerSnapshot::new(&name, *index, &stations, text.clone()),
            );
            while let Some(snapshot) = snapshots.next().await {
                yield snapshot;
            }
        })
    }

    pub async fn tuner_snapshot(&self) -> Result<TunerSnapshot> {
        current(self.tuner_updates()).await
    }

    pub async fn stations(&self) -> Vec<Station> {
        self.fm.list().await.to_vec()
    }

    pub async fn invoke_tuner(&self, call: &RpcCall) -> Result<TunerSnapshot> {
        match TunerCommand::parse(call)? {
            TunerCommand::Select(index) => self.fm.select(index).await?,
        }
        self.tuner_snapshot().await
    }

    pub fn tuner_methods(&self) -> Vec<MethodDesc> {
        TunerCommand::describe(&format!("/tuners/{}/rpc", TUNER_NAME))
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    pub async fn artists(&self) -> Vec<Artist> {
        self.browser.all_artists().await
    }

    pub async fn albums(&self) -> Vec<Album> {
        self.browser.all_albums().await
    }

    pub async fn artist(&self, id: u32) -> Result<Artist> {
        self.browser.artist_by(id).await
    }

    pub async fn album(&self, id: u32) -> Result<Album> {
        self.browser.album_by_id(id).await
    }

    // ========================================================================
    // Audio
    // ========================================================================

    pub fn audio_status(&self, connection: Connection) -> AudioStatus {
        AudioStatus {
            connection,
            state: self.audio.state(connection),
        }
    }

    pub fn audio_statuses(&self) -> Vec<AudioStatus> {
        Connection::ALL
            .iter()
            .map(|c| self.audio_status(*c))
            .collect()
    }

    pub fn audio_updates(&self, connection: Connection) -> LiveStream<AudioStatus> {
        self.audio
            .observe(connection)
            .map(move |item| item.map(|state| AudioStatus { connection, state }))
            .boxed()
    }

    pub async fn invoke_audio(&self, connection: Connection, call: &RpcCall) -> Result<AudioStatus> {
        match AudioCommand::parse(call)? {
            AudioCommand::Start => self.audio.start(connection).await?,
            AudioCommand::Stop => self.audio.stop(connection).await?,
            AudioCommand::FadeIn => self.audio.fade_in(connection).await?,
            AudioCommand::FadeOut => self.audio.fade_out(connection).await?,
        }
        Ok(self.audio_status(connection))
    }

    pub fn audio_methods(&self, connection: Connection) -> Vec<MethodDesc> {
        AudioCommand::describe(&format!("/audio/{}/rpc", connection.as_str()))
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// JSON view of `resource`; live resources keep emitting, the rest emit once
    pub fn watch(&self, resource: Resource) -> LiveStream<Value> {
        match resource {
            Resource::Root => once_json(async { Ok(root_document()) }),
            Resource::Players => to_json(self.players_updates()),
            Resource::Player(id) => to_json(self.player_updates(id)),
            Resource::Tracks { player, from, to } => {
                let player = Arc::clone(self.player(player));
                once_json(async move { Ok(clamped(&player.list().await, from, to).to_vec()) })
            }
            Resource::PlayerMethods(id) => {
                let methods = self.player_methods(id);
                once_json(async move { Ok(methods) })
            }
            Resource::Tuners => to_json(
                self.tuner_updates()
                    .map(|item| item.map(|snapshot| vec![snapshot]))
                    .boxed(),
            ),
            Resource::Tuner => to_json(self.tuner_updates()),
            Resource::Stations => {
                let tuner = Arc::clone(&self.fm);
                once_json(async move { Ok(tuner.list().await.to_vec()) })
            }
            Resource::TunerMethods => {
                let methods = self.tuner_methods();
                once_json(async move { Ok(methods) })
            }
            Resource::Artists => {
                let browser = Arc::clone(&self.browser);
                once_json(async move { Ok(browser.all_artists().await) })
            }
            Resource::Albums => {
                let browser = Arc::clone(&self.browser);
                once_json(async move { Ok(browser.all_albums().await) })
            }
            Resource::Artist(id) => {
                let browser = Arc::clone(&self.browser);
                once_json(async move { browser.artist_by(id).await })
            }
            Resource::Album(id) => {
                let browser = Arc::clone(&self.browser);
                once_json(async move { browser.album_by_id(id).await })
            }
            Resource::Audio => to_json(combine_latest_all(
                Connection::ALL
                    .iter()
                    .map(|c| self.audio_updates(*c))
                    .collect(),
            )),
            Resource::AudioConnection(connection) => to_json(self.audio_updates(connection)),
            Resource::AudioMethods(connection) => {
                let methods = self.audio_methods(connection);
                once_json(async move { Ok(methods) })
            }
        }
    }

    /// Tag every update of `resource` with the caller's correlation id
    ///
    /// A failure is delivered as a final error envelope.
    pub fn subscribe(&self, id: &str, resource: Resource) -> BoxStream<'static, Envelope> {
        let id = id.to_string();
        let mut updates = self.watch(resource);
        Box::pin(async_stream::stream! {
            while let Some(item) = updates.next().await {
                match item {
                    Ok(payload) => yield Envelope::payload(&id, payload),
                    Err(error) => {
                        yield Envelope::error(&id, &error);
                        break;
                    }
                }
            }
        })
    }
}

/// Links to the top-level resources
pub fn root_document() -> Value {
    json!({"resources": ["/players", "/tuners", "/albums", "/artists", "/audio"]})
}

fn clamped(tracks: &[Track], from: Option<usize>, to: Option<usize>) -> &[Track] {
    let to = to.unwrap_or(tracks.len()).min(tracks.len());
    let from = from.unwrap_or(0).min(to);
    &tracks[from..to]
}

fn to_json<T>(updates: LiveStream<T>) -> LiveStream<Value>
where
    T: Serialize + Send + 'static,
{
    updates
        .map(|item| {
            item.and_then(|value| {
                serde_json::to_value(value).map_err(|e| Error::Internal(e.to_string()))
            })
        })
        .boxed()
}

fn once_json<T, F>(fut: F) -> LiveStream<Value>
where
    T: Serialize + Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    to_json(stream::once(fut).boxed())
}
