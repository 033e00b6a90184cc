//! Player service
//!
//! Runs a [`PlayerController`] on a single tokio task. Commands from any
//! number of [`PlayerHandle`]s, engine callbacks, and poll ticks are all
//! applied on that task, one at a time. After each step the service publishes
//! a snapshot and starts or stops the position poller to match the status.

use crate::{
    controller::PlayerController,
    engine::SoundEngine,
    error::{PlayerError, Result},
    events::PlayerEvent,
    poller::PositionPoller,
    types::{PlayerSnapshot, PlayerStatus},
};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info};

/// Commands sent to the player task
#[derive(Debug)]
pub enum PlayerCommand {
    /// Start or resume playback
    Play,

    /// Pause playback
    Pause,

    /// Stop playback
    Stop,

    /// Skip to next track
    Next,

    /// Go to previous track
    Previous,

    /// Select a track by playlist index
    Load(usize),

    /// Seek to position (in seconds)
    SeekTo(f64),

    /// Skip forward by the time rate
    IncreaseTime,

    /// Skip back by the time rate
    DecreaseTime,

    /// Set speed multiplier
    SetSpeed(f32),

    /// Set volume (0-100)
    ChangeVolume(u8),

    /// Mute audio
    Mute,

    /// Unmute audio
    Unmute,

    /// Toggle mute
    ToggleMute,

    /// Toggle shuffle
    ToggleShuffle,

    /// Toggle loop
    ToggleLoop,

    /// Reply with the current state
    Snapshot(oneshot::Sender<PlayerSnapshot>),

    /// Release the engine and end the task
    Shutdown(oneshot::Sender<()>),
}

/// Command channel capacity
const COMMAND_CAPACITY: usize = 32;

/// Event channel capacity (slow subscribers lag and skip)
const EVENT_CAPACITY: usize = 256;

/// Owner of the controller task
pub struct PlayerService<E: SoundEngine> {
    controller: PlayerController<E>,
    commands: mpsc::Receiver<PlayerCommand>,
    ticks_tx: mpsc::Sender<()>,
    ticks_rx: mpsc::Receiver<()>,
    poller: PositionPoller,
    state_tx: watch::Sender<PlayerSnapshot>,
    events_tx: broadcast::Sender<PlayerEvent>,
}

impl<E> PlayerService<E>
where
    E: SoundEngine + 'static,
{
    /// Move the controller onto a new task
    ///
    /// Must be called from within a tokio runtime. The poll period comes
    /// from the controller's options.
    pub fn spawn(controller: PlayerController<E>) -> PlayerHandle {
        let period = Duration::from_millis(controller.options().poll_interval_ms);
        let (command_tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let (ticks_tx, ticks_rx) = mpsc::channel(1);
        let (state_tx, state_rx) = watch::channel(controller.snapshot());
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let service = Self {
            controller,
            commands,
            ticks_tx,
            ticks_rx,
            poller: PositionPoller::new(period),
            state_tx,
            events_tx: events_tx.clone(),
        };

        tokio::spawn(service.run());

        PlayerHandle {
            commands: command_tx,
            state: state_rx,
            events: events_tx,
        }
    }

    async fn run(mut self) {
        debug!("Player service started");
        // Callbacks may already be queued from the initial load
        self.controller.process_notifications();
        self.sync();

        let done = loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(PlayerCommand::Shutdown(done)) => break Some(done),
                    Some(command) => self.apply(command),
                    // Every handle dropped
                    None => break None,
                },
                Some(notification) = self.controller.next_notification() => {
                    self.controller.handle_notification(notification);
                }
                Some(()) = self.ticks_rx.recv() => {
                    self.controller.poll_position();
                }
            }

            self.sync();
        };

        // Later sends fail with ServiceClosed
        self.commands.close();
        self.poller.stop();
        self.controller.dispose();
        info!("Player service stopped");

        if let Some(done) = done {
            done.send(()).ok();
        }
    }

    fn apply(&mut self, command: PlayerCommand) {
        let controller = &mut self.controller;

        match command {
            PlayerCommand::Play => controller.play(),
            PlayerCommand::Pause => controller.pause(),
            PlayerCommand::Stop => controller.stop(),
            PlayerCommand::Next => controller.next(),
            PlayerCommand::Previous => controller.previous(),
            PlayerCommand::Load(index) => controller.load(index),
            PlayerCommand::SeekTo(seconds) => controller.seek_to_time(seconds),
            PlayerCommand::IncreaseTime => controller.increase_time(),
            PlayerCommand::DecreaseTime => controller.decrease_time(),
            PlayerCommand::SetSpeed(speed) => controller.set_speed(speed),
            PlayerCommand::ChangeVolume(level) => controller.change_volume(level),
            PlayerCommand::Mute => controller.mute(),
            PlayerCommand::Unmute => controller.unmute(),
            PlayerCommand::ToggleMute => controller.toggle_mute(),
            PlayerCommand::ToggleShuffle => controller.toggle_shuffle(),
            PlayerCommand::ToggleLoop => controller.toggle_loop(),
            PlayerCommand::Snapshot(reply) => {
                reply.send(controller.snapshot()).ok();
            }
            // Handled by the run loop
            PlayerCommand::Shutdown(_) => {}
        }
    }

    /// Publish state and match the poller to the status
    fn sync(&mut self) {
        if self.controller.status() == PlayerStatus::Playing {
            self.poller.start(self.ticks_tx.clone());
        } else {
            self.poller.stop();
        }

        for event in self.controller.take_events() {
            // No subscribers is fine
            self.events_tx.send(event).ok();
        }

        let snapshot = self.controller.snapshot();
        self.state_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

/// Cloneable handle to a running player service
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
    state: watch::Receiver<PlayerSnapshot>,
    events: broadcast::Sender<PlayerEvent>,
}

impl PlayerHandle {
    /// Send a raw command
    pub async fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlayerError::ServiceClosed)
    }

    pub async fn play(&self) -> Result<()> {
        self.send(PlayerCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(PlayerCommand::Pause).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(PlayerCommand::Stop).await
    }

    pub async fn next(&self) -> Result<()> {
        self.send(PlayerCommand::Next).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.send(PlayerCommand::Previous).await
    }

    pub async fn load(&self, index: usize) -> Result<()> {
        self.send(PlayerCommand::Load(index)).await
    }

    pub async fn seek_to_time(&self, seconds: f64) -> Result<()> {
        self.send(PlayerCommand::SeekTo(seconds)).await
    }

    pub async fn increase_time(&self) -> Result<()> {
        self.send(PlayerCommand::IncreaseTime).await
    }

    pub async fn decrease_time(&self) -> Result<()> {
        self.send(PlayerCommand::DecreaseTime).await
    }

    pub async fn set_speed(&self, speed: f32) -> Result<()> {
        self.send(PlayerCommand::SetSpeed(speed)).await
    }

    pub async fn change_volume(&self, level: u8) -> Result<()> {
        self.send(PlayerCommand::ChangeVolume(level)).await
    }

    pub async fn mute(&self) -> Result<()> {
        self.send(PlayerCommand::Mute).await
    }

    pub async fn unmute(&self) -> Result<()> {
        self.send(PlayerCommand::Unmute).await
    }

    pub async fn toggle_mute(&self) -> Result<()> {
        self.send(PlayerCommand::ToggleMute).await
    }

    pub async fn toggle_shuffle(&self) -> Result<()> {
        self.send(PlayerCommand::ToggleShuffle).await
    }

    pub async fn toggle_loop(&self) -> Result<()> {
        self.send(PlayerCommand::ToggleLoop).await
    }

    /// Current state, read on the player task
    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(PlayerCommand::Snapshot(reply)).await?;
        response.await.map_err(|_| PlayerError::ServiceClosed)
    }

    /// Last published state, without a round trip
    pub fn latest(&self) -> PlayerSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every state change
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.state.clone()
    }

    /// Receiver for discrete player events
    pub fn events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Release the engine and stop the task
    ///
    /// Other handles get `ServiceClosed` afterwards.
    pub async fn shutdown(&self) -> Result<()> {
        let (done, finished) = oneshot::channel();
        self.send(PlayerCommand::Shutdown(done)).await?;
        finished.await.map_err(|_| PlayerError::ServiceClosed)
    }
}
