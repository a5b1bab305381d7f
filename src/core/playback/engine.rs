//! core/playback/engine.rs
//! Playback engine (session owner).
//!
//! Owns:
//! - the PlaybackSession (nobody else mutates it)
//! - the AudioBackend (rodio in production)
//! - command loop + periodic position polling
//! - the pending background load, if any
//!
//! Emits PlayerEvent back via a channel and publishes a SessionSnapshot
//! after every command and tick.
//! No Iced imports.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use super::backend::AudioBackend;
use super::loader::{LoadOutcome, StreamLoader, extension_hint};
use super::session::{Direction, MAX_VOLUME, PlaybackSession, SessionSnapshot, advance_index};
use super::{PlayerCommand, PlayerEvent};
use crate::core::metadata::read_metadata;
use crate::core::types::{FileReference, PlayMode, TrackMetadata, TransportState};

/// Normalized position at which a track counts as finished.
pub const COMPLETION_THRESHOLD: f32 = 0.99;

/// A load that has been requested but whose stream has not arrived yet.
#[derive(Debug)]
struct PendingLoad {
    generation: u64,
    file: FileReference,
    /// Working-playlist slot. None for a standalone `load(file)`.
    index: Option<usize>,
    autoplay: bool,
}

enum Flow {
    Continue,
    Exit,
}

pub struct PlaybackEngine {
    session: PlaybackSession,
    backend: Box<dyn AudioBackend>,
    metadata: Option<TrackMetadata>,

    loader: StreamLoader,
    load_tx: Sender<LoadOutcome>,
    load_rx: Receiver<LoadOutcome>,

    /// Last generation handed out.
    generation: u64,
    pending: Option<PendingLoad>,
    /// Generation of the media currently bound to the backend.
    bound_generation: Option<u64>,
    /// Auto-advance fires at most once per bound media.
    advanced_for: Option<u64>,

    poll_interval: Duration,
    event_tx: Sender<PlayerEvent>,
    shared: Arc<RwLock<SessionSnapshot>>,
}

impl PlaybackEngine {
    pub fn new(
        backend: Box<dyn AudioBackend>,
        loader: StreamLoader,
        event_tx: Sender<PlayerEvent>,
        shared: Arc<RwLock<SessionSnapshot>>,
        poll_interval: Duration,
    ) -> Self {
        let (load_tx, load_rx) = mpsc::channel();

        Self {
            session: PlaybackSession::default(),
            backend,
            metadata: None,
            loader,
            load_tx,
            load_rx,
            generation: 0,
            pending: None,
            bound_generation: None,
            advanced_for: None,
            poll_interval,
            event_tx,
            shared,
        }
    }

    pub fn run(&mut self, command_rx: Receiver<PlayerCommand>) {
        loop {
            // One bad iteration must not take the loop down with it.
            match panic::catch_unwind(AssertUnwindSafe(|| self.step(&command_rx))) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(_) => {
                    tracing::error!("playback loop iteration panicked; continuing");
                    self.publish();
                }
            }
        }

        self.backend.stop();
        tracing::debug!("playback engine stopped");
    }

    fn step(&mut self, command_rx: &Receiver<PlayerCommand>) -> Flow {
        match command_rx.recv_timeout(self.poll_interval) {
            Ok(cmd) => {
                self.handle_command(cmd);
                while let Ok(cmd) = command_rx.try_recv() {
                    self.handle_command(cmd);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return Flow::Exit,
        }

        self.tick();
        Flow::Continue
    }

    fn handle_command(&mut self, cmd: PlayerCommand) {
        match cmd {
            PlayerCommand::Load(file) => self.load(file),
            PlayerCommand::Play => self.play(),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Stop => self.stop(),
            PlayerCommand::Seek(position) => {
                self.seek(position);
            }
            PlayerCommand::SetVolume(volume) => {
                self.set_volume(volume);
            }
            PlayerCommand::SetPlayMode(mode) => self.set_play_mode(mode),
            PlayerCommand::Next => {
                self.next_track();
            }
            PlayerCommand::Previous => {
                self.previous_track();
            }
            PlayerCommand::SetPlaylist {
                entries,
                start_index,
            } => {
                self.set_playlist(entries, start_index);
            }
        }

        self.publish();
    }

    /// Apply finished loads, then poll.
    pub fn tick(&mut self) {
        while let Ok(outcome) = self.load_rx.try_recv() {
            self.apply_load(outcome);
        }
        self.poll();
        self.publish();
    }

    // ---------------------------------------------------------------------
    // Transport
    // ---------------------------------------------------------------------

    /// Resolve and bind `file`. Does not start playback.
    ///
    /// If the file is in the working playlist the index follows it; otherwise
    /// the working playlist becomes just this file (once the load succeeds).
    pub fn load(&mut self, file: FileReference) {
        self.begin_load(file, None, false);
    }

    pub fn play(&mut self) {
        // A newer track is on its way; start that one instead.
        if let Some(pending) = self.pending.as_mut() {
            pending.autoplay = true;
            return;
        }

        match self.session.state {
            TransportState::Playing => {}
            TransportState::Paused => {
                if let Err(e) = self.backend.play() {
                    self.emit_error(format!("Resume failed: {e}"));
                    return;
                }
                self.set_state(TransportState::Playing);
            }
            TransportState::Stopped => {
                if self.session.current_file.is_none() || self.session.current_index.is_none() {
                    return;
                }
                if let Err(e) = self.backend.play() {
                    self.emit_error(format!("Playback failed: {e}"));
                    return;
                }
                self.set_state(TransportState::Playing);
            }
        }
    }

    pub fn pause(&mut self) {
        if self.session.state != TransportState::Playing {
            return;
        }
        self.backend.pause();
        self.set_state(TransportState::Paused);
    }

    pub fn stop(&mut self) {
        if let Some(pending) = self.pending.as_mut() {
            pending.autoplay = false;
        }

        self.backend.stop();
        self.session.position = 0.0;
        self.session.state = TransportState::Stopped;
        self.emit(PlayerEvent::StateChanged(TransportState::Stopped));
    }

    /// Returns false (and changes nothing) for positions outside 0.0..=1.0
    /// or when nothing is loaded.
    pub fn seek(&mut self, position: f32) -> bool {
        if !(0.0..=1.0).contains(&position) || self.session.current_file.is_none() {
            return false;
        }

        if let Err(e) = self.backend.seek(position) {
            self.emit_error(format!("Seek failed: {e}"));
            return false;
        }

        self.session.position = position;
        if position < COMPLETION_THRESHOLD {
            // Rearm auto-advance for the bound media.
            self.advanced_for = None;
        }
        self.emit(PlayerEvent::PositionChanged(position));
        true
    }

    /// 0..=100. Anything above is rejected.
    pub fn set_volume(&mut self, volume: u8) -> bool {
        if volume > MAX_VOLUME {
            return false;
        }
        self.backend.set_volume(f32::from(volume) / f32::from(MAX_VOLUME));
        self.session.volume = volume;
        true
    }

    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.session.play_mode = mode;
    }

    pub fn next_track(&mut self) -> bool {
        self.advance(Direction::Next)
    }

    pub fn previous_track(&mut self) -> bool {
        self.advance(Direction::Previous)
    }

    /// Replace the working playlist and start playing `start_index`.
    pub fn set_playlist(&mut self, entries: Vec<FileReference>, start_index: usize) -> bool {
        if start_index >= entries.len() {
            tracing::debug!(
                len = entries.len(),
                start_index,
                "set_playlist ignored: nothing to start"
            );
            return false;
        }

        self.stop();
        self.pending = None;
        self.session.working_playlist = entries;
        self.session.current_index = None;
        self.session.current_file = None;
        self.metadata = None;

        self.load_index(start_index);
        true
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn get_position(&self) -> f32 {
        if self.session.current_file.is_none() {
            return 0.0;
        }
        self.backend.position()
    }

    /// Length in ms of the bound media, 0 if unknown.
    pub fn get_length(&self) -> u64 {
        if self.session.current_file.is_none() {
            return 0;
        }
        self.backend.length_ms()
    }

    pub fn is_playing(&self) -> bool {
        self.session.state == TransportState::Playing
    }

    pub fn metadata(&self) -> Option<&TrackMetadata> {
        self.metadata.as_ref()
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn advance(&mut self, direction: Direction) -> bool {
        // Chained presses step from the track that is on its way.
        let anchor = self
            .pending
            .as_ref()
            .and_then(|p| p.index)
            .or(self.session.current_index);

        let Some(index) = advance_index(
            self.session.play_mode,
            direction,
            anchor,
            self.session.working_playlist.len(),
            &mut rand::rng(),
        ) else {
            return false;
        };

        self.load_index(index);
        true
    }

    fn load_index(&mut self, index: usize) {
        let Some(file) = self.session.working_playlist.get(index).cloned() else {
            return;
        };
        self.begin_load(file, Some(index), true);
    }

    fn begin_load(&mut self, file: FileReference, index: Option<usize>, autoplay: bool) {
        self.generation += 1;
        let generation = self.generation;

        tracing::info!(generation, path = %file.path, "loading");

        self.pending = Some(PendingLoad {
            generation,
            file: file.clone(),
            index,
            autoplay,
        });
        self.loader.spawn(generation, file, self.load_tx.clone());
    }

    fn apply_load(&mut self, outcome: LoadOutcome) {
        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|p| p.generation == outcome.generation);
        if !is_current {
            tracing::debug!(generation = outcome.generation, "discarding stale load");
            return;
        }
        let Some(pending) = self.pending.take() else {
            return;
        };

        let media = match outcome.result {
            Ok(media) => media,
            Err(message) => {
                tracing::warn!("{message}");
                self.emit_error(message);
                return;
            }
        };

        // Stop whatever is active before switching the source.
        self.backend.stop();
        if self.session.state != TransportState::Stopped {
            self.session.state = TransportState::Stopped;
            self.emit(PlayerEvent::StateChanged(TransportState::Stopped));
        }

        let hint = extension_hint(&pending.file.name);
        let bytes = media.bytes.clone();
        if let Err(e) = self.backend.open(media, hint.as_deref()) {
            self.emit_error(format!("Could not open {}: {e}", pending.file.name));
            return;
        }

        let index = match pending.index {
            Some(i) => i,
            None => match self.session.index_of(&pending.file) {
                Some(i) => i,
                None => {
                    self.session.working_playlist = vec![pending.file.clone()];
                    0
                }
            },
        };

        self.metadata = Some(read_metadata(
            &bytes,
            &pending.file,
            self.backend.length_ms(),
        ));
        self.session.current_index = Some(index);
        self.session.current_file = Some(pending.file.clone());
        self.session.position = 0.0;
        self.bound_generation = Some(pending.generation);
        self.advanced_for = None;

        self.emit(PlayerEvent::TrackChanged(pending.file));

        if pending.autoplay {
            self.play();
        }
    }

    fn poll(&mut self) {
        if self.session.state != TransportState::Playing {
            return;
        }

        let position = self.get_position();
        if position != self.session.position {
            self.session.position = position;
            self.emit(PlayerEvent::PositionChanged(position));
        }

        let finished = position >= COMPLETION_THRESHOLD || self.backend.finished();
        if !finished || self.pending.is_some() || self.advanced_for == self.bound_generation {
            return;
        }

        self.advanced_for = self.bound_generation;
        tracing::debug!(position, "track finished; advancing");

        match self.session.play_mode {
            PlayMode::SingleRepeat => self.restart(),
            PlayMode::Sequential | PlayMode::Random => {
                self.next_track();
            }
        }
    }

    /// Replay the bound media from the top without fetching it again.
    fn restart(&mut self) {
        if !self.seek(0.0) {
            return;
        }
        if let Err(e) = self.backend.play() {
            self.emit_error(format!("Playback failed: {e}"));
            self.set_state(TransportState::Stopped);
        }
    }

    fn set_state(&mut self, state: TransportState) {
        if self.session.state == state {
            return;
        }
        self.session.state = state;
        self.emit(PlayerEvent::StateChanged(state));
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.event_tx.send(event);
    }

    fn emit_error(&self, message: String) {
        self.emit(PlayerEvent::Error(message));
    }

    fn publish(&self) {
        let snapshot = SessionSnapshot {
            session: self.session.clone(),
            length_ms: self.get_length(),
            metadata: self.metadata.clone(),
        };
        let mut shared = self.shared.write().unwrap_or_else(PoisonError::into_inner);
        *shared = snapshot;
    }

    /// Block until the pending load (if any) has been applied.
    #[cfg(test)]
    fn settle(&mut self) {
        while self.pending.is_some() {
            match self.load_rx.recv_timeout(Duration::from_secs(5)) {
                Ok(outcome) => self.apply_load(outcome),
                Err(_) => panic!("load never finished"),
            }
        }
        self.publish();
    }
}
