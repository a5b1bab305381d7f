//! core/playback/loader.rs
//! Resolve + download off the engine thread.
//!
//! Every load gets a generation number from the engine. The loader thread
//! sends back `(generation, result)`; the engine applies only the newest one.

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use crate::core::remote::{MediaFetcher, MediaSource, RemoteResolver};
use crate::core::types::FileReference;

#[derive(Debug)]
pub(crate) struct LoadOutcome {
    pub generation: u64,
    pub result: Result<MediaSource, String>,
}

#[derive(Clone)]
pub struct StreamLoader {
    resolver: Arc<dyn RemoteResolver>,
    fetcher: Arc<dyn MediaFetcher>,
}

impl StreamLoader {
    pub fn new(resolver: Arc<dyn RemoteResolver>, fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self { resolver, fetcher }
    }

    /// Start a background load. The outcome always arrives on `tx`,
    /// unless the receiver is gone.
    pub(crate) fn spawn(&self, generation: u64, file: FileReference, tx: Sender<LoadOutcome>) {
        let this = self.clone();
        let fallback_tx = tx.clone();

        let spawned = thread::Builder::new()
            .name(format!("nimbus-load-{generation}"))
            .spawn(move || {
                let result = this.load(&file);
                let _ = tx.send(LoadOutcome { generation, result });
            });

        if let Err(e) = spawned {
            tracing::error!("failed to spawn loader thread: {e}");
            let _ = fallback_tx.send(LoadOutcome {
                generation,
                result: Err(format!("Could not start loading: {e}")),
            });
        }
    }

    fn load(&self, file: &FileReference) -> Result<MediaSource, String> {
        tracing::debug!(path = %file.path, "resolving");

        let url = self
            .resolver
            .resolve_playable_url(file)
            .map_err(|e| format!("Could not resolve {}: {e}", file.name))?;

        self.fetcher
            .fetch(&url)
            .map_err(|e| format!("Could not load {}: {e}", file.name))
    }
}

/// Lowercased extension of a display name, used as a decoder hint.
pub(crate) fn extension_hint(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{MockFetcher, MockResolver};
    use std::sync::mpsc;
    use std::time::Duration;

    fn loader(resolver: MockResolver) -> StreamLoader {
        StreamLoader::new(Arc::new(resolver), Arc::new(MockFetcher::default()))
    }

    #[test]
    fn outcome_carries_generation_and_bytes() {
        let (tx, rx) = mpsc::channel();
        let file = FileReference::new(5, "/m/a.mp3", "a.mp3");

        loader(MockResolver::default()).spawn(9, file, tx);

        let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.generation, 9);
        let media = outcome.result.unwrap();
        assert!(media.url.contains("/m/a.mp3"));
        assert!(!media.bytes.is_empty());
    }

    #[test]
    fn resolver_failure_becomes_message() {
        let (tx, rx) = mpsc::channel();
        let file = FileReference::new(5, "/m/gone.mp3", "gone.mp3");

        let resolver = MockResolver::default();
        resolver.fail_path("/m/gone.mp3");
        loader(resolver).spawn(1, file, tx);

        let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let err = outcome.result.unwrap_err();
        assert!(err.contains("gone.mp3"), "{err}");
    }

    #[test]
    fn extension_hint_is_lowercased() {
        assert_eq!(extension_hint("Song.FLAC").as_deref(), Some("flac"));
        assert_eq!(extension_hint("noext"), None);
        assert_eq!(extension_hint(".mp3"), None);
    }
}
