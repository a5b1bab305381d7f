//! core/playlist/mod.rs
//! Named playlists + recent history, persisted as JSON, with a validity cache.
//!
//! Locking:
//! - `library` guards playlists and history (and their files on disk)
//! - `cache` guards the validity cache
//! - the resolver is never called with either lock held

mod history;
mod persist;
mod sweep;
mod validity;

use std::collections::{BTreeMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub use history::{RECENT_CAPACITY, RecentHistory};
pub use persist::{PlaylistFiles, Playlists};
pub use sweep::{RevalidationHandle, spawn_revalidation, sweep_once};
pub use validity::ValidityCache;

use crate::core::error::StoreError;
use crate::core::remote::RemoteResolver;
use crate::core::types::FileReference;

struct Library {
    playlists: Playlists,
    recent: RecentHistory,
}

pub struct PlaylistStore {
    library: Mutex<Library>,
    cache: Mutex<ValidityCache>,
    resolver: Arc<dyn RemoteResolver>,
    files: PlaylistFiles,
}

impl PlaylistStore {
    /// Load whatever is in `dir` (missing/corrupt records start empty).
    pub fn open(
        dir: impl Into<PathBuf>,
        resolver: Arc<dyn RemoteResolver>,
        validity_ttl: Duration,
    ) -> Self {
        let files = PlaylistFiles::new(dir);
        let playlists = files.load_playlists();
        let recent = RecentHistory::from_entries(files.load_recent());

        tracing::info!(
            playlists = playlists.len(),
            recent = recent.len(),
            "loaded playlists from {}",
            files.dir().display()
        );

        Self {
            library: Mutex::new(Library { playlists, recent }),
            cache: Mutex::new(ValidityCache::new(validity_ttl)),
            resolver,
            files,
        }
    }

    // ---------------------------------------------------------------------
    // Playlists
    // ---------------------------------------------------------------------

    pub fn create_playlist(&self, name: &str) -> Result<(), StoreError> {
        let mut lib = self.library();
        if lib.playlists.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        lib.playlists.insert(name.to_string(), Vec::new());
        self.persist_playlists(&lib);
        Ok(())
    }

    pub fn delete_playlist(&self, name: &str) -> Result<(), StoreError> {
        let mut lib = self.library();
        if lib.playlists.remove(name).is_none() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        self.persist_playlists(&lib);
        Ok(())
    }

    pub fn rename_playlist(&self, old: &str, new: &str) -> Result<(), StoreError> {
        let mut lib = self.library();
        if !lib.playlists.contains_key(old) {
            return Err(StoreError::NotFound(old.to_string()));
        }
        if lib.playlists.contains_key(new) {
            return Err(StoreError::AlreadyExists(new.to_string()));
        }
        if let Some(entries) = lib.playlists.remove(old) {
            lib.playlists.insert(new.to_string(), entries);
        }
        self.persist_playlists(&lib);
        Ok(())
    }

    /// Append files whose paths are not already present. Returns how many
    /// were added.
    pub fn add_to_playlist(&self, name: &str, files: &[FileReference]) -> Result<usize, StoreError> {
        let mut lib = self.library();
        let list = lib
            .playlists
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

        let mut seen: HashSet<String> = list.iter().map(|f| f.path.clone()).collect();
        let before = list.len();
        for file in files {
            if seen.insert(file.path.clone()) {
                list.push(file.clone());
            }
        }
        let added = list.len() - before;

        if added > 0 {
            self.persist_playlists(&lib);
        }
        Ok(added)
    }

    /// Remove the entries at `indices` (positions before any removal).
    /// Out-of-range and repeated indices are ignored. Returns how many were removed.
    pub fn remove_from_playlist(&self, name: &str, indices: &[usize]) -> Result<usize, StoreError> {
        let mut lib = self.library();
        let list = lib
            .playlists
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

        let mut sorted: Vec<usize> = indices.iter().copied().filter(|&i| i < list.len()).collect();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();

        for &i in &sorted {
            list.remove(i);
        }

        self.persist_playlists(&lib);
        Ok(sorted.len())
    }

    /// Move one entry from `from` to `to`.
    pub fn reorder_playlist(&self, name: &str, from: usize, to: usize) -> Result<(), StoreError> {
        let mut lib = self.library();
        let list = lib
            .playlists
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

        let len = list.len();
        for index in [from, to] {
            if index >= len {
                return Err(StoreError::IndexOutOfRange { index, len });
            }
        }

        let file = list.remove(from);
        list.insert(to, file);

        self.persist_playlists(&lib);
        Ok(())
    }

    pub fn get_playlist(&self, name: &str) -> Option<Vec<FileReference>> {
        self.library().playlists.get(name).cloned()
    }

    pub fn get_all_playlists(&self) -> BTreeMap<String, Vec<FileReference>> {
        self.library().playlists.clone()
    }

    // ---------------------------------------------------------------------
    // Recent
    // ---------------------------------------------------------------------

    pub fn add_to_recent(&self, file: FileReference) {
        let mut lib = self.library();
        lib.recent.touch(file);
        if let Err(e) = self.files.save_recent(&lib.recent.to_vec()) {
            tracing::warn!("failed to save recent history: {e}");
        }
    }

    /// Newest first.
    pub fn get_recent_played(&self) -> Vec<FileReference> {
        self.library().recent.to_vec()
    }

    // ---------------------------------------------------------------------
    // Validity
    // ---------------------------------------------------------------------

    /// Cached answer if fresh, otherwise ask the resolver. Resolver failures
    /// (and panics) count as "invalid"; nothing is propagated.
    pub fn check_file_validity(&self, file: &FileReference) -> bool {
        self.check_file_validity_at(file, Instant::now())
    }

    pub(crate) fn check_file_validity_at(&self, file: &FileReference, now: Instant) -> bool {
        if let Some(valid) = self.cache().lookup(&file.path, now) {
            return valid;
        }

        let resolver = &self.resolver;
        let valid = match panic::catch_unwind(AssertUnwindSafe(|| {
            resolver.resolve_playable_url(file)
        })) {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(path = %file.path, "validity check failed: {e}");
                false
            }
            Err(_) => {
                tracing::warn!(path = %file.path, "resolver panicked during validity check");
                false
            }
        };

        self.cache().record(&file.path, valid, now);
        valid
    }

    /// Cached answer only; never touches the network.
    pub fn cached_validity(&self, path: &str) -> Option<bool> {
        self.cached_validity_at(path, Instant::now())
    }

    pub(crate) fn cached_validity_at(&self, path: &str, now: Instant) -> Option<bool> {
        self.cache().lookup(path, now)
    }

    /// Every file referenced by any playlist or the history, once per path.
    pub fn referenced_files(&self) -> Vec<FileReference> {
        let lib = self.library();
        let mut seen: HashSet<&str> = HashSet::new();
        lib.playlists
            .values()
            .flatten()
            .chain(lib.recent.iter())
            .filter(|f| seen.insert(f.path.as_str()))
            .cloned()
            .collect()
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn library(&self) -> MutexGuard<'_, Library> {
        self.library.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cache(&self) -> MutexGuard<'_, ValidityCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write failures leave the in-memory change in place.
    fn persist_playlists(&self, lib: &Library) {
        if let Err(e) = self.files.save_playlists(&lib.playlists) {
            tracing::warn!("failed to save playlists: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{MockResolver, files};
    use std::fs;

    const TTL: Duration = Duration::from_secs(3600);

    fn open(dir: &std::path::Path) -> (PlaylistStore, Arc<MockResolver>) {
        let resolver = Arc::new(MockResolver::default());
        let store = PlaylistStore::open(dir, resolver.clone(), TTL);
        (store, resolver)
    }

    fn names(list: &[FileReference]) -> Vec<&str> {
        list.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn create_delete_rename() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = open(dir.path());

        store.create_playlist("A").unwrap();
        assert!(matches!(
            store.create_playlist("A"),
            Err(StoreError::AlreadyExists(_))
        ));

        store.create_playlist("B").unwrap();
        assert!(matches!(
            store.rename_playlist("A", "B"),
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            store.rename_playlist("nope", "C"),
            Err(StoreError::NotFound(_))
        ));
        store.rename_playlist("A", "C").unwrap();

        assert!(store.get_playlist("A").is_none());
        assert_eq!(store.get_playlist("C"), Some(Vec::new()));

        store.delete_playlist("C").unwrap();
        assert!(matches!(
            store.delete_playlist("C"),
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(
            store.get_all_playlists().keys().collect::<Vec<_>>(),
            vec!["B"]
        );
    }

    #[test]
    fn add_never_duplicates_paths() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = open(dir.path());
        store.create_playlist("P").unwrap();

        let list = files(&["a", "b", "c"]);
        assert_eq!(store.add_to_playlist("P", &list[..2]).unwrap(), 2);
        assert_eq!(store.add_to_playlist("P", &list).unwrap(), 1);
        assert_eq!(
            store.add_to_playlist("P", &[list[0].clone(), list[0].clone()]).unwrap(),
            0
        );

        let got = store.get_playlist("P").unwrap();
        assert_eq!(names(&got), vec!["a", "b", "c"]);
        assert!(matches!(
            store.add_to_playlist("missing", &list),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn remove_uses_original_positions() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = open(dir.path());
        store.create_playlist("P").unwrap();
        store
            .add_to_playlist("P", &files(&["a", "b", "c", "d"]))
            .unwrap();

        let removed = store.remove_from_playlist("P", &[2, 0, 3, 9]).unwrap();
        assert_eq!(removed, 3);
        assert_eq!(names(&store.get_playlist("P").unwrap()), vec!["b"]);
    }

    #[test]
    fn reorder_moves_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = open(dir.path());
        store.create_playlist("P").unwrap();
        store
            .add_to_playlist("P", &files(&["A", "B", "C", "D"]))
            .unwrap();

        store.reorder_playlist("P", 0, 2).unwrap();
        assert_eq!(
            names(&store.get_playlist("P").unwrap()),
            vec!["B", "C", "A", "D"]
        );

        assert!(matches!(
            store.reorder_playlist("P", 0, 4),
            Err(StoreError::IndexOutOfRange { index: 4, len: 4 })
        ));
    }

    #[test]
    fn recent_is_capped_and_deduped() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = open(dir.path());

        let names_31: Vec<String> = (0..31).map(|i| format!("{i}.mp3")).collect();
        let refs: Vec<&str> = names_31.iter().map(String::as_str).collect();
        let list = files(&refs);
        for file in &list {
            store.add_to_recent(file.clone());
        }

        let recent = store.get_recent_played();
        assert_eq!(recent.len(), RECENT_CAPACITY);
        assert_eq!(recent[0], list[30]);
        assert_eq!(recent[29], list[1]);

        store.add_to_recent(list[10].clone());
        let recent = store.get_recent_played();
        assert_eq!(recent.len(), RECENT_CAPACITY);
        assert_eq!(recent[0], list[10]);
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let list = files(&["a", "b"]);
        {
            let (store, _) = open(dir.path());
            store.create_playlist("Road Trip").unwrap();
            store.add_to_playlist("Road Trip", &list).unwrap();
            store.add_to_recent(list[1].clone());
        }

        let (store, _) = open(dir.path());
        assert_eq!(store.get_playlist("Road Trip"), Some(list.clone()));
        assert_eq!(store.get_recent_played(), vec![list[1].clone()]);
    }

    #[test]
    fn corrupt_records_start_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("playlists.json"), "{ nope").unwrap();
        fs::write(dir.path().join("recent.json"), "42").unwrap();

        let (store, _) = open(dir.path());
        assert!(store.get_all_playlists().is_empty());
        assert!(store.get_recent_played().is_empty());

        // And the store still works (and overwrites the bad file).
        store.create_playlist("Fresh").unwrap();
        let (reopened, _) = open(dir.path());
        assert!(reopened.get_playlist("Fresh").is_some());
    }

    #[test]
    fn write_failures_keep_in_memory_changes() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the record directory should be.
        let blocked = dir.path().join("playlists");
        fs::write(&blocked, "not a directory").unwrap();

        let (store, _) = open(&blocked);
        let list = files(&["a.mp3", "b.mp3"]);

        store.create_playlist("Offline").unwrap();
        assert_eq!(store.add_to_playlist("Offline", &list).unwrap(), 2);
        store.add_to_recent(list[0].clone());

        assert_eq!(store.get_playlist("Offline"), Some(list.clone()));
        assert_eq!(store.get_recent_played(), vec![list[0].clone()]);
        assert!(blocked.is_file());
    }

    #[test]
    fn validity_is_cached_for_the_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let (store, resolver) = open(dir.path());
        let file = files(&["a.mp3"]).remove(0);
        let t0 = Instant::now();

        assert!(store.check_file_validity_at(&file, t0));
        assert!(store.check_file_validity_at(&file, t0 + Duration::from_secs(60)));
        assert_eq!(resolver.calls(), 1);

        resolver.fail_path(&file.path);
        assert!(!store.check_file_validity_at(&file, t0 + TTL + Duration::from_secs(1)));
        assert_eq!(resolver.calls(), 2);
    }

    #[test]
    fn resolver_panic_reads_as_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let (store, resolver) = open(dir.path());
        let file = files(&["boom.mp3"]).remove(0);
        resolver.panic_on(&file.path);

        assert!(!store.check_file_validity(&file));
        assert_eq!(store.cached_validity(&file.path), Some(false));
    }
}
