//! core/playlist/sweep.rs
//! Background revalidation.
//!
//! Sweeps once at start, then every `interval`, until the handle is shut
//! down or dropped.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::PlaylistStore;

pub struct RevalidationHandle {
    stop_tx: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl RevalidationHandle {
    /// Stop the sweep thread and wait for it.
    pub fn shutdown(mut self) {
        self.stop_tx.take();
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                tracing::warn!("revalidation thread panicked");
            }
        }
    }
}

impl Drop for RevalidationHandle {
    fn drop(&mut self) {
        // Disconnecting is enough; the thread exits at its next wakeup.
        self.stop_tx.take();
    }
}

pub fn spawn_revalidation(store: Arc<PlaylistStore>, interval: Duration) -> RevalidationHandle {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let spawned = thread::Builder::new()
        .name("nimbus-revalidate".into())
        .spawn(move || {
            loop {
                match panic::catch_unwind(AssertUnwindSafe(|| sweep_once(&store))) {
                    Ok(checked) => tracing::debug!(checked, "revalidation sweep done"),
                    Err(_) => tracing::error!("revalidation sweep panicked; continuing"),
                }

                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

    let join = match spawned {
        Ok(join) => Some(join),
        Err(e) => {
            tracing::error!("failed to spawn revalidation thread: {e}");
            None
        }
    };

    RevalidationHandle {
        stop_tx: Some(stop_tx),
        join,
    }
}

/// Check every file referenced by any playlist or the recent history.
/// Returns how many were checked.
pub fn sweep_once(store: &PlaylistStore) -> usize {
    {
        let mut cache = store.cache();
        cache.purge_expired(Instant::now());
        tracing::debug!(cached = cache.len(), "starting revalidation sweep");
    }

    let files = store.referenced_files();
    for file in &files {
        store.check_file_validity(file);
    }
    files.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{MockResolver, files};

    fn store(resolver: Arc<MockResolver>) -> (Arc<PlaylistStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = PlaylistStore::open(dir.path(), resolver, Duration::from_secs(3600));
        (Arc::new(store), dir)
    }

    #[test]
    fn sweep_covers_playlists_and_recent_and_survives_panics() {
        let resolver = Arc::new(MockResolver::default());
        resolver.panic_on("/music/boom.mp3");
        resolver.fail_path("/music/gone.mp3");
        let (store, _dir) = store(resolver.clone());

        let list = files(&["ok.mp3", "boom.mp3", "gone.mp3", "late.mp3"]);
        store.create_playlist("Mix").unwrap();
        store.add_to_playlist("Mix", &list[..3]).unwrap();
        store.add_to_recent(list[3].clone());
        store.add_to_recent(list[0].clone());

        assert_eq!(sweep_once(&store), 4);

        let now = Instant::now();
        assert_eq!(store.cached_validity_at("/music/ok.mp3", now), Some(true));
        assert_eq!(store.cached_validity_at("/music/boom.mp3", now), Some(false));
        assert_eq!(store.cached_validity_at("/music/gone.mp3", now), Some(false));
        assert_eq!(store.cached_validity_at("/music/late.mp3", now), Some(true));
        assert_eq!(resolver.calls(), 4);
    }

    #[test]
    fn background_sweep_runs_and_stops() {
        let resolver = Arc::new(MockResolver::default());
        let (store, _dir) = store(resolver.clone());
        store.create_playlist("Mix").unwrap();
        store
            .add_to_playlist("Mix", &files(&["a.mp3", "b.mp3"]))
            .unwrap();

        let handle = spawn_revalidation(store.clone(), Duration::from_millis(20));

        let deadline = Instant::now() + Duration::from_secs(5);
        while resolver.calls() < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        handle.shutdown();

        assert!(resolver.calls() >= 2);
        let calls = resolver.calls();
        thread::sleep(Duration::from_millis(60));
        assert_eq!(resolver.calls(), calls);
    }
}
