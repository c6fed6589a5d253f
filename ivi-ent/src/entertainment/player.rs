//! Media player engine
//!
//! A player owns an immutable track list, the selected index and a playing flag.
//! `play`, `pause` and `select` complete after a command delay; `play` is refused
//! unless the player's audio connection is STARTED (when the guard is enabled).

use super::audio::Audio;
use crate::error::{Error, Result};
use crate::live::{LiveStream, LiveValue};
use crate::scheduler::SerialScheduler;
use async_trait::async_trait;
use ivi_common::{AudioState, Connection, Track};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

#[async_trait]
pub trait Player: Send + Sync {
    fn name(&self) -> &str;

    /// Full track list, after the list delay
    async fn list(&self) -> Arc<[Track]>;

    /// Live index of the selected track
    fn now_playing(&self) -> LiveStream<usize>;

    fn is_playing(&self) -> LiveStream<bool>;

    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    /// Select a track; the index is not checked against the track list
    async fn select(&self, index: usize) -> Result<()>;
}

/// Timing and guard settings for one player
#[derive(Debug, Clone)]
pub struct PlayerSettings {
    pub command_delay: Duration,
    pub list_delay: Duration,
    pub check_audio: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            command_delay: Duration::from_millis(500),
            list_delay: Duration::from_millis(100),
            check_audio: true,
        }
    }
}

struct PlayerInner {
    name: String,
    connection: Connection,
    tracks: Arc<[Track]>,
    audio: Arc<dyn Audio>,
    scheduler: SerialScheduler,
    settings: PlayerSettings,
    index: LiveValue<usize>,
    playing: LiveValue<bool>,
}

/// Player bound to one audio connection
pub struct PlayerEngine {
    inner: Arc<PlayerInner>,
}

impl PlayerEngine {
    pub fn new(
        name: &str,
        connection: Connection,
        tracks: Arc<[Track]>,
        audio: Arc<dyn Audio>,
        scheduler: SerialScheduler,
        settings: PlayerSettings,
    ) -> Self {
        info!(
            "Player '{}' on {} with {} tracks",
            name,
            connection,
            tracks.len()
        );
        Self {
            inner: Arc::new(PlayerInner {
                name: name.to_string(),
                connection,
                tracks,
                audio,
                scheduler,
                settings,
                index: LiveValue::new(0),
                playing: LiveValue::new(false),
            }),
        }
    }

    pub fn connection(&self) -> Connection {
        self.inner.connection
    }

    /// Run `command` on the worker and wait for the delayed effect it schedules
    async fn run<F>(&self, command: F) -> Result<()>
    where
        F: FnOnce(&Arc<PlayerInner>) -> Result<oneshot::Receiver<()>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let applied = self
            .inner
            .scheduler
            .submit(move || command(&inner))
            .await??;

        applied
            .await
            .map_err(|_| Error::Internal(format!("player '{}' dropped a command", self.inner.name)))
    }
}

impl PlayerInner {
    fn begin_play(self: &Arc<Self>) -> Result<oneshot::Receiver<()>> {
        if self.settings.check_audio {
            if self.playing.get() {
                warn!("Player '{}' is already playing", self.name);
                return Err(Error::InvalidTransition(format!(
                    "player '{}' is already playing",
                    self.name
                )));
            }
            let audio = self.audio.state(self.connection);
            if audio != AudioState::Started {
                warn!(
                    "Player '{}' cannot play: {} is {}",
                    self.name, self.connection, audio
                );
                return Err(Error::InvalidTransition(format!(
                    "player '{}' cannot play while {} is {}",
                    self.name, self.connection, audio
                )));
            }
        }

        info!("Player '{}': play", self.name);
        Ok(self.after_delay(|player| player.playing.set(true)))
    }

    fn begin_pause(self: &Arc<Self>) -> Result<oneshot::Receiver<()>> {
        if !self.playing.get() {
            warn!("Player '{}' is not playing", self.name);
            return Err(Error::InvalidTransition(format!(
                "player '{}' is not playing",
                self.name
            )));
        }

        info!("Player '{}': pause", self.name);
        Ok(self.after_delay(|player| player.playing.set(false)))
    }

    fn begin_select(self: &Arc<Self>, index: usize) -> oneshot::Receiver<()> {
        info!("Player '{}': select track {}", self.name, index);
        self.after_delay(move |player| player.index.set(index))
    }

    /// Apply `effect` on the worker once the command delay elapses
    fn after_delay<F>(self: &Arc<Self>, effect: F) -> oneshot::Receiver<()>
    where
        F: FnOnce(&PlayerInner) + Send + 'static,
    {
        let (done, applied) = oneshot::channel();
        let player = Arc::clone(self);
        let _ = self.scheduler.schedule(self.settings.command_delay, move || {
            effect(&player);
            debug!("Player '{}' command applied", player.name);
            let _ = done.send(());
        });
        applied
    }
}

#[async_trait]
impl Player for PlayerEngine {
    fn name(&self) -> &str {
        &self.inner.name
    }

    async fn list(&self) -> Arc<[Track]> {
        tokio::time::sleep(self.inner.settings.list_delay).await;
        Arc::clone(&self.inner.tracks)
    }

    fn now_playing(&self) -> LiveStream<usize> {
        self.inner.index.subscribe()
    }

    fn is_playing(&self) -> LiveStream<bool> {
        self.inner.playing.subscribe()
    }

    async fn play(&self) -> Result<()> {
        self.run(|player| player.begin_play()).await
    }

    async fn pause(&self) -> Result<()> {
        self.run(|player| player.begin_pause()).await
    }

    async fn select(&self, index: usize) -> Result<()> {
        self.run(move |player| Ok(player.begin_select(index))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::current;
    use futures::StreamExt;
    use tokio::time::Instant;

    const DELAY: Duration = Duration::from_millis(500);

    /// Audio stand-in whose connection state is set directly by the test
    struct AudioMock {
        state: LiveValue<AudioState>,
    }

    impl AudioMock {
        fn new(state: AudioState) -> Arc<Self> {
            Arc::new(Self {
                state: LiveValue::new(state),
            })
        }
    }

    #[async_trait]
    impl Audio for AudioMock {
        async fn start(&self, _: Connection) -> Result<()> {
            Err(Error::Internal("not mocked".to_string()))
        }

        async fn stop(&self, _: Connection) -> Result<()> {
            Err(Error::Internal("not mocked".to_string()))
        }

        async fn fade_in(&self, _: Connection) -> Result<()> {
            Err(Error::Internal("not mocked".to_string()))
        }

        async fn fade_out(&self, _: Connection) -> Result<()> {
            Err(Error::Internal("not mocked".to_string()))
        }

        fn observe(&self, _: Connection) -> LiveStream<AudioState> {
            self.state.subscribe()
        }

        fn state(&self, _: Connection) -> AudioState {
            self.state.get()
        }
    }

    fn tracks(count: u32) -> Arc<[Track]> {
        (0..count)
            .map(|id| Track {
                id,
                album_id: id % 7,
                artist_id: id % 5,
                title: format!("Track {}", id),
                duration_seconds: 180 + id,
            })
            .collect()
    }

    fn player_with(audio: Arc<AudioMock>, count: u32, check_audio: bool) -> PlayerEngine {
        PlayerEngine::new(
            "usb",
            Connection::Usb,
            tracks(count),
            audio,
            SerialScheduler::spawn("player-test"),
            PlayerSettings {
                check_audio,
                ..PlayerSettings::default()
            },
        )
    }

    fn player(state: AudioState) -> PlayerEngine {
        player_with(AudioMock::new(state), 600, true)
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracks_are_available_after_a_delay() {
        let player = player(AudioState::Stopped);

        let begun = Instant::now();
        let list = player.list().await;
        assert_eq!(list.len(), 600);
        assert!(begun.elapsed() >= Duration::from_millis(100));

        let again = player.list().await;
        assert_eq!(list, again);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_state() {
        let player = player(AudioState::Stopped);
        assert_eq!(current(player.now_playing()).await, Ok(0));
        assert_eq!(current(player.is_playing()).await, Ok(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_after_delay_when_audio_started() {
        let player = player(AudioState::Started);
        let mut playing = player.is_playing();
        assert_eq!(playing.next().await, Some(Ok(false)));

        let begun = Instant::now();
        player.play().await.unwrap();
        assert!(begun.elapsed() >= DELAY);
        assert_eq!(playing.next().await, Some(Ok(true)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_refused_unless_audio_started() {
        for state in [AudioState::Stopped, AudioState::Starting, AudioState::Stopping] {
            let player = player(state);
            let result = player.play().await;
            assert!(
                matches!(result, Err(Error::InvalidTransition(_))),
                "play allowed while audio is {}",
                state
            );
            assert_eq!(current(player.is_playing()).await, Ok(false));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_play_fails_and_keeps_playing() {
        let player = player(AudioState::Started);
        player.play().await.unwrap();

        let mut playing = player.is_playing();
        assert_eq!(playing.next().await, Some(Ok(true)));

        let result = player.play().await;
        assert!(matches!(result, Err(Error::InvalidTransition(_))));

        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(current(player.is_playing()).await, Ok(true));
        // No further emission after the refused call
        let next = tokio::time::timeout(Duration::from_secs(5), playing.next()).await;
        assert!(next.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_requires_playing() {
        let player = player(AudioState::Started);
        assert!(matches!(
            player.pause().await,
            Err(Error::InvalidTransition(_))
        ));

        player.play().await.unwrap();
        let begun = Instant::now();
        player.pause().await.unwrap();
        assert!(begun.elapsed() >= DELAY);
        assert_eq!(current(player.is_playing()).await, Ok(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_applies_only_after_delay() {
        let player = player(AudioState::Stopped);
        let mut index = player.now_playing();
        assert_eq!(index.next().await, Some(Ok(0)));

        let begun = Instant::now();
        let selecting = player.select(450);
        tokio::pin!(selecting);

        // Nothing visible before the delay elapses
        tokio::select! {
            _ = &mut selecting => panic!("select completed early"),
            _ = tokio::time::sleep(DELAY - Duration::from_millis(10)) => {}
        }
        assert_eq!(current(player.now_playing()).await, Ok(0));

        selecting.await.unwrap();
        assert!(begun.elapsed() >= DELAY);
        assert_eq!(index.next().await, Some(Ok(450)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_is_not_bounds_checked() {
        let player = player_with(AudioMock::new(AudioState::Stopped), 3, true);
        player.select(99).await.unwrap();
        assert_eq!(current(player.now_playing()).await, Ok(99));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_disabled_allows_play_without_audio() {
        let player = player_with(AudioMock::new(AudioState::Stopped), 10, false);
        player.play().await.unwrap();
        player.play().await.unwrap();
        assert_eq!(current(player.is_playing()).await, Ok(true));
    }
}
