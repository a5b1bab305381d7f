//! core/testing.rs
//! Test doubles for the remote boundary and the audio backend.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::error::{PlaybackError, ResolveError};
use super::playback::AudioBackend;
use super::remote::{MediaFetcher, MediaSource, RemoteResolver};
use super::types::FileReference;

/// Resolves `path` to `mock://path`. Individual paths can be made to fail,
/// panic or stall.
#[derive(Default)]
pub struct MockResolver {
    calls: AtomicUsize,
    failing: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl MockResolver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_path(&self, path: &str) {
        self.failing.lock().unwrap().insert(path.to_string());
    }

    pub fn heal_path(&self, path: &str) {
        self.failing.lock().unwrap().remove(path);
    }

    pub fn panic_on(&self, path: &str) {
        self.panicking.lock().unwrap().insert(path.to_string());
    }

    pub fn delay_path(&self, path: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(path.to_string(), delay);
    }
}

impl RemoteResolver for MockResolver {
    fn resolve_playable_url(&self, file: &FileReference) -> Result<String, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().get(&file.path).copied();
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        if self.panicking.lock().unwrap().contains(&file.path) {
            panic!("resolver blew up on {}", file.path);
        }
        if self.failing.lock().unwrap().contains(&file.path) {
            return Err(ResolveError::MissingLink(file.id));
        }
        Ok(format!("mock://{}", file.path))
    }
}

/// "Downloads" a URL by returning its own text as the bytes.
#[derive(Default)]
pub struct MockFetcher;

impl MediaFetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Result<MediaSource, PlaybackError> {
        Ok(MediaSource {
            url: url.to_string(),
            bytes: Arc::from(url.as_bytes()),
        })
    }
}

#[derive(Debug, Default)]
pub struct MockState {
    pub bound: Option<String>,
    pub opened: usize,
    pub playing: bool,
    pub paused: bool,
    pub position: f32,
    pub length_ms: u64,
    pub volume: f32,
    pub drained: bool,
    /// The next `position()` call panics (once).
    pub panic_on_position: bool,
}

/// In-memory backend. Clones share state, so a test can keep one clone
/// and move the other into the engine.
#[derive(Clone, Default)]
pub struct MockBackend {
    pub state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn set_position(&self, position: f32) {
        self.state.lock().unwrap().position = position;
    }

    pub fn bound(&self) -> Option<String> {
        self.state.lock().unwrap().bound.clone()
    }

    pub fn opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    pub fn playing(&self) -> bool {
        let s = self.state.lock().unwrap();
        s.playing && !s.paused
    }

    pub fn panic_next_position(&self) {
        self.state.lock().unwrap().panic_on_position = true;
    }

    pub fn panic_pending(&self) -> bool {
        self.state.lock().unwrap().panic_on_position
    }
}

impl AudioBackend for MockBackend {
    fn open(&mut self, media: MediaSource, _hint_ext: Option<&str>) -> Result<(), PlaybackError> {
        let mut s = self.state.lock().unwrap();
        s.bound = Some(media.url);
        s.opened += 1;
        s.playing = false;
        s.paused = false;
        s.position = 0.0;
        s.length_ms = 180_000;
        s.drained = false;
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        let mut s = self.state.lock().unwrap();
        if s.bound.is_none() {
            return Err(PlaybackError::NoMedia);
        }
        s.playing = true;
        s.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.lock().unwrap().paused = true;
    }

    fn stop(&mut self) {
        let mut s = self.state.lock().unwrap();
        s.playing = false;
        s.paused = false;
        s.position = 0.0;
    }

    fn seek(&mut self, position: f32) -> Result<(), PlaybackError> {
        self.state.lock().unwrap().position = position;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.lock().unwrap().volume = volume;
    }

    fn position(&self) -> f32 {
        let mut s = self.state.lock().unwrap();
        if std::mem::take(&mut s.panic_on_position) {
            // Release the lock first so the shared state is not poisoned.
            drop(s);
            panic!("backend position read failed");
        }
        s.position
    }

    fn length_ms(&self) -> u64 {
        self.state.lock().unwrap().length_ms
    }

    fn finished(&self) -> bool {
        self.state.lock().unwrap().drained
    }
}

pub fn files(names: &[&str]) -> Vec<FileReference> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| FileReference::new(i as u64 + 1, format!("/music/{name}"), *name))
        .collect()
}
