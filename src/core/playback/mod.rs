//! core/playback/mod.rs
//! Nimbus playback core module.
//!
//! The engine runs on its own thread. The UI talks to it through
//! `PlaybackController` (commands in, snapshots out) and drains
//! `PlayerEvent`s on its own tick.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::Duration;

mod backend;
mod decoder;
mod engine;
mod loader;
mod session;

pub use backend::{AudioBackend, RodioBackend};
pub use decoder::SampleTap;
pub use engine::PlaybackEngine;
pub use loader::StreamLoader;
pub use session::{MAX_VOLUME, SessionSnapshot};

use crate::core::types::{FileReference, PlayMode, TrackMetadata, TransportState};

#[derive(Clone)]
pub struct PlaybackController {
    command_tx: Sender<PlayerCommand>,
    shared: Arc<RwLock<SessionSnapshot>>,
    tap: SampleTap,
}

impl PlaybackController {
    /// Best-effort send. If the engine died, the command is dropped.
    pub fn send(&self, cmd: PlayerCommand) {
        let _ = self.command_tx.send(cmd);
    }

    /// Copy of the session as of the engine's last command or tick.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Length in ms, 0 if unknown.
    pub fn get_length(&self) -> u64 {
        self.snapshot().length_ms
    }

    pub fn metadata(&self) -> Option<TrackMetadata> {
        self.snapshot().metadata
    }

    /// Most recently decoded samples (interleaved), at most 2048.
    pub fn audio_samples(&self) -> Vec<f32> {
        self.tap.snapshot()
    }
}

#[derive(Debug)]
pub enum PlayerCommand {
    Load(FileReference),
    Play,
    Pause,
    Stop,
    Seek(f32),     // 0.0..=1.0
    SetVolume(u8), // 0..=100
    SetPlayMode(PlayMode),
    Next,
    Previous,
    SetPlaylist {
        entries: Vec<FileReference>,
        start_index: usize,
    },
}

/// The only four notifications the engine fires.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged(TransportState),
    PositionChanged(f32),
    TrackChanged(FileReference),
    Error(String),
}

/// Spawns playback thread and returns:
/// - PlaybackController (store in GUI state)
/// - Receiver<PlayerEvent> (drained by the GUI tick)
///
/// If no audio output can be opened, a single Error event is sent and the
/// controller's commands go nowhere.
pub fn start_playback(
    loader: StreamLoader,
    poll_interval: Duration,
) -> (PlaybackController, Receiver<PlayerEvent>) {
    let (command_tx, command_rx) = mpsc::channel::<PlayerCommand>();
    let (event_tx, event_rx) = mpsc::channel::<PlayerEvent>();

    let shared = Arc::new(RwLock::new(SessionSnapshot::default()));
    let tap = SampleTap::new();

    let engine_shared = shared.clone();
    let engine_tap = tap.clone();

    let spawned = thread::Builder::new()
        .name("nimbus-playback".into())
        .spawn(move || {
            // rodio's OutputStream is not Send, so the backend is built here.
            let backend = match RodioBackend::new(engine_tap) {
                Ok(b) => b,
                Err(e) => {
                    tracing::error!("audio output unavailable: {e}");
                    let _ = event_tx.send(PlayerEvent::Error(e.to_string()));
                    return;
                }
            };

            let mut engine = PlaybackEngine::new(
                Box::new(backend),
                loader,
                event_tx,
                engine_shared,
                poll_interval,
            );
            engine.run(command_rx);
        });

    if let Err(e) = spawned {
        tracing::error!("failed to spawn playback thread: {e}");
    }

    (
        PlaybackController {
            command_tx,
            shared,
            tap,
        },
        event_rx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_reads_published_snapshot() {
        let (command_tx, _command_rx) = mpsc::channel();
        let shared = Arc::new(RwLock::new(SessionSnapshot::default()));
        let controller = PlaybackController {
            command_tx,
            shared: shared.clone(),
            tap: SampleTap::new(),
        };

        {
            let mut snap = shared.write().unwrap();
            snap.session.position = 0.25;
            snap.session.state = TransportState::Playing;
            snap.length_ms = 90_000;
        }

        let snap = controller.snapshot();
        assert_eq!(snap.session.position, 0.25);
        assert_eq!(snap.session.state, TransportState::Playing);
        assert_eq!(controller.get_length(), 90_000);
        assert!(controller.metadata().is_none());
        assert!(controller.audio_samples().is_empty());
    }

    #[test]
    fn send_after_engine_exit_is_harmless() {
        let (command_tx, command_rx) = mpsc::channel();
        drop(command_rx);
        let controller = PlaybackController {
            command_tx,
            shared: Arc::default(),
            tap: SampleTap::new(),
        };
        controller.send(PlayerCommand::Play);
    }
}
