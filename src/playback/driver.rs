//! Host-side frame loop for a [`PlaybackController`].
//!
//! The controller lives inside one tokio task and is only touched there, so it
//! needs no lock. Commands from [`PlaybackHandle`]s are serviced between
//! frames and take priority over a pending tick, which is what makes `stop`
//! and a new `start` land before the superseded session ticks again.

use crate::config::ReplaySettings;
use crate::core::{PlaybackError, RoutePoint};
use crate::geo::{LonLat, Projection};
use crate::playback::controller::{PlaybackController, TickToken};
use crate::playback::PlaybackEvent;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Maximum queued commands before handles wait
const COMMAND_QUEUE: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("playback driver has shut down")]
    Closed,
}

enum Command {
    Start {
        route: Vec<RoutePoint>,
        speed: f64,
        reply: oneshot::Sender<Result<(), PlaybackError>>,
    },
    Stop {
        ack: oneshot::Sender<()>,
    },
    Reset {
        ack: oneshot::Sender<()>,
    },
    Subscribe {
        reply: oneshot::Sender<mpsc::UnboundedReceiver<PlaybackEvent>>,
    },
    Shutdown,
}

pub struct PlaybackDriver;

impl PlaybackDriver {
    /// Spawn a driver on the current tokio runtime
    pub fn spawn(settings: &ReplaySettings) -> PlaybackHandle {
        Self::spawn_with(LonLat, settings)
    }

    pub fn spawn_with<P>(projection: P, settings: &ReplaySettings) -> PlaybackHandle
    where
        P: Projection + Send + 'static,
    {
        let controller = PlaybackController::new(projection, settings.base_duration());
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        let frame_interval = settings.frame_interval();

        tokio::spawn(async move {
            run(controller, rx, frame_interval).await;
        });

        PlaybackHandle { tx }
    }
}

async fn run<P: Projection>(
    mut controller: PlaybackController<P>,
    mut commands: mpsc::Receiver<Command>,
    frame_interval: Duration,
) {
    let mut pending: Option<TickToken> = None;
    let mut next_frame = Instant::now();

    loop {
        let command = match pending {
            Some(token) => {
                tokio::select! {
                    biased;
                    command = commands.recv() => command,
                    _ = sleep_until(next_frame) => {
                        pending = controller.tick(token, Instant::now());
                        // Next frame is only scheduled once this one is done
                        next_frame = Instant::now() + frame_interval;
                        continue;
                    }
                }
            }
            None => commands.recv().await,
        };

        match command {
            Some(Command::Start { route, speed, reply }) => {
                let now = Instant::now();
                let result = controller.start(&route, speed, now).map(|token| {
                    pending = Some(token);
                    next_frame = now;
                });
                if let Err(e) = &result {
                    warn!("Rejected playback start: {}", e);
                }
                let _ = reply.send(result);
            }
            Some(Command::Stop { ack }) => {
                controller.stop();
                pending = None;
                let _ = ack.send(());
            }
            Some(Command::Reset { ack }) => {
                controller.reset();
                pending = None;
                let _ = ack.send(());
            }
            Some(Command::Subscribe { reply }) => {
                let _ = reply.send(controller.subscribe());
            }
            Some(Command::Shutdown) | None => break,
        }
    }

    controller.reset();
    info!("Playback driver stopped");
}

/// Cloneable front end to a running [`PlaybackDriver`]
#[derive(Clone)]
pub struct PlaybackHandle {
    tx: mpsc::Sender<Command>,
}

impl PlaybackHandle {
    /// Start replaying `route`, replacing whatever is playing
    ///
    /// Returns once the driver has accepted or rejected the session; a
    /// rejected start leaves the previous session running.
    pub async fn start(&self, route: Vec<RoutePoint>, speed: f64) -> Result<(), DriverError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start { route, speed, reply }).await?;
        rx.await.map_err(|_| DriverError::Closed)??;
        Ok(())
    }

    /// Cancel the current session. No completion event is sent.
    pub async fn stop(&self) -> Result<(), DriverError> {
        let (ack, rx) = oneshot::channel();
        self.send(Command::Stop { ack }).await?;
        rx.await.map_err(|_| DriverError::Closed)
    }

    pub async fn reset(&self) -> Result<(), DriverError> {
        let (ack, rx) = oneshot::channel();
        self.send(Command::Reset { ack }).await?;
        rx.await.map_err(|_| DriverError::Closed)
    }

    pub async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<PlaybackEvent>, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Subscribe { reply }).await?;
        rx.await.map_err(|_| DriverError::Closed)
    }

    pub async fn shutdown(&self) {
        debug!("Shutting down playback driver");
        let _ = self.tx.send(Command::Shutdown).await;
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, command: Command) -> Result<(), DriverError> {
        self.tx.send(command).await.map_err(|_| DriverError::Closed)
    }
}
