//! Audio connection routing
//!
//! Three connections (USB, CD, RADIO) share one speaker. Each cycles
//! STOPPED → STARTING → STARTED → STOPPING → STOPPED, and at most one connection
//! is away from STOPPED at any time. The STARTING and STOPPING legs complete
//! after a settle delay that simulates the hardware handshake.

use crate::error::{Error, Result};
use crate::live::{LiveStream, LiveValue};
use crate::scheduler::{ScheduledTask, SerialScheduler};
use async_trait::async_trait;
use ivi_common::{AudioState, Connection};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Audio routing as seen by players and the gateway
#[async_trait]
pub trait Audio: Send + Sync {
    /// Begin routing `connection` to the speaker
    async fn start(&self, connection: Connection) -> Result<()>;

    /// Release the speaker
    async fn stop(&self, connection: Connection) -> Result<()>;

    async fn fade_in(&self, connection: Connection) -> Result<()>;

    async fn fade_out(&self, connection: Connection) -> Result<()>;

    /// Live state of `connection`, starting with the current one
    fn observe(&self, connection: Connection) -> LiveStream<AudioState>;

    /// Current state of `connection`
    fn state(&self, connection: Connection) -> AudioState;
}

struct ConnectionSlot {
    state: LiveValue<AudioState>,
    /// Settle timer for the transition in progress, if any
    pending: Mutex<Option<ScheduledTask>>,
}

struct AudioInner {
    scheduler: SerialScheduler,
    slots: [ConnectionSlot; 3],
    settle_delay: Duration,
    fade_ramp: Duration,
}

/// Owner of the three audio connection state machines
#[derive(Clone)]
pub struct AudioConnectionManager {
    inner: Arc<AudioInner>,
}

impl AudioConnectionManager {
    pub fn new(scheduler: SerialScheduler, settle_delay: Duration, fade_ramp: Duration) -> Self {
        let slots = Connection::ALL.map(|_| ConnectionSlot {
            state: LiveValue::new(AudioState::Stopped),
            pending: Mutex::new(None),
        });

        Self {
            inner: Arc::new(AudioInner {
                scheduler,
                slots,
                settle_delay,
                fade_ramp,
            }),
        }
    }

    /// Simulate a hardware fault on `connection`
    ///
    /// The pending transition is dropped, the connection falls back to STOPPED and
    /// every open `observe` stream for it ends with `InvalidTransition`.
    pub async fn fault(&self, connection: Connection, reason: &str) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        let reason = reason.to_string();
        self.inner
            .scheduler
            .submit(move || inner.fault(connection, &reason))
            .await
    }

    async fn fade(&self, connection: Connection, operation: &'static str) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        let ramp = self
            .inner
            .scheduler
            .submit(move || inner.begin_fade(connection, operation))
            .await??;

        ramp.await
            .map_err(|_| Error::Internal(format!("{} on {} was abandoned", operation, connection)))
    }
}

impl AudioInner {
    fn slot(&self, connection: Connection) -> &ConnectionSlot {
        &self.slots[connection.index()]
    }

    fn start(self: &Arc<Self>, connection: Connection) -> Result<()> {
        let current = self.slot(connection).state.get();
        if current != AudioState::Stopped {
            warn!("Rejecting start of {}: connection is {}", connection, current);
            return Err(Error::InvalidTransition(format!(
                "cannot start {} while it is {}",
                connection, current
            )));
        }

        let busy = Connection::ALL
            .iter()
            .copied()
            .filter(|other| *other != connection)
            .find(|other| self.slot(*other).state.get() != AudioState::Stopped);
        if let Some(other) = busy {
            let state = self.slot(other).state.get();
            warn!("Rejecting start of {}: {} is {}", connection, other, state);
            return Err(Error::InvalidTransition(format!(
                "cannot start {} while {} is {}",
                connection, other, state
            )));
        }

        info!("Starting audio connection {}", connection);
        self.transition(connection, AudioState::Starting, AudioState::Started);
        Ok(())
    }

    fn stop(self: &Arc<Self>, connection: Connection) -> Result<()> {
        let current = self.slot(connection).state.get();
        if !matches!(current, AudioState::Starting | AudioState::Started) {
            warn!("Rejecting stop of {}: connection is {}", connection, current);
            return Err(Error::InvalidTransition(format!(
                "cannot stop {} while it is {}",
                connection, current
            )));
        }

        info!("Stopping audio connection {}", connection);
        self.transition(connection, AudioState::Stopping, AudioState::Stopped);
        Ok(())
    }

    /// Enter `now` and settle into `then` after the settle delay
    fn transition(self: &Arc<Self>, connection: Connection, now: AudioState, then: AudioState) {
        let slot = self.slot(connection);
        slot.state.set(now);

        if let Some(previous) = slot.pending.lock().take() {
            debug!("Cancelling pending {} transition", connection);
            previous.cancel();
        }

        let inner = Arc::clone(self);
        let task = self.scheduler.schedule(self.settle_delay, move || {
            let slot = inner.slot(connection);
            slot.pending.lock().take();
            debug!("Audio connection {} settled: {}", connection, then);
            slot.state.set(then);
        });
        *slot.pending.lock() = Some(task);
    }

    fn begin_fade(
        &self,
        connection: Connection,
        operation: &'static str,
    ) -> Result<oneshot::Receiver<()>> {
        let current = self.slot(connection).state.get();
        if current != AudioState::Started {
            warn!("Rejecting {} on {}: connection is {}", operation, connection, current);
            return Err(Error::InvalidTransition(format!(
                "cannot {} {} while it is {}",
                operation, connection, current
            )));
        }

        debug!("{} on {}", operation, connection);
        let (done, ramp) = oneshot::channel();
        // Ramp completion carries no state change, so the handle is not kept
        let _ = self.scheduler.schedule(self.fade_ramp, move || {
            let _ = done.send(());
        });
        Ok(ramp)
    }

    fn fault(&self, connection: Connection, reason: &str) {
        let slot = self.slot(connection);
        if let Some(pending) = slot.pending.lock().take() {
            pending.cancel();
        }

        warn!("Audio fault on {}: {}", connection, reason);
        slot.state.fail(
            Error::InvalidTransition(format!("audio fault on {}: {}", connection, reason)),
            Some(AudioState::Stopped),
        );
    }
}

#[async_trait]
impl Audio for AudioConnectionManager {
    async fn start(&self, connection: Connection) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .scheduler
            .submit(move || inner.start(connection))
            .await?
    }

    async fn stop(&self, connection: Connection) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .scheduler
            .submit(move || inner.stop(connection))
            .await?
    }

    async fn fade_in(&self, connection: Connection) -> Result<()> {
        self.fade(connection, "fadeIn").await
    }

    async fn fade_out(&self, connection: Connection) -> Result<()> {
        self.fade(connection, "fadeOut").await
    }

    fn observe(&self, connection: Connection) -> LiveStream<AudioState> {
        self.inner.slot(connection).state.subscribe()
    }

    fn state(&self, connection: Connection) -> AudioState {
        self.inner.slot(connection).state.get()
    }
}
