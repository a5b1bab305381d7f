//! core/playlist/persist.rs
//! On-disk records: `playlists.json` and `recent.json`.
//!
//! - Each save rewrites the whole file (temp file + rename)
//! - Missing file -> empty
//! - Corrupt file -> empty + warning

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::error::StoreError;
use crate::core::types::FileReference;

pub type Playlists = BTreeMap<String, Vec<FileReference>>;

const PLAYLISTS_FILE: &str = "playlists.json";
const RECENT_FILE: &str = "recent.json";

#[derive(Debug, Clone)]
pub struct PlaylistFiles {
    dir: PathBuf,
}

impl PlaylistFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_playlists(&self) -> Playlists {
        self.load_or_empty(PLAYLISTS_FILE)
    }

    pub fn load_recent(&self) -> Vec<FileReference> {
        self.load_or_empty(RECENT_FILE)
    }

    pub fn save_playlists(&self, playlists: &Playlists) -> Result<(), StoreError> {
        self.save(PLAYLISTS_FILE, playlists)
    }

    pub fn save_recent(&self, recent: &[FileReference]) -> Result<(), StoreError> {
        self.save(RECENT_FILE, recent)
    }

    fn load_or_empty<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.dir.join(name);

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return T::default(),
            Err(e) => {
                tracing::warn!("could not read {}: {e}; starting empty", path.display());
                return T::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("{} is malformed ({e}); starting empty", path.display());
                T::default()
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(value)?;
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = PlaylistFiles::new(dir.path().join("never-created"));
        assert!(files.load_playlists().is_empty());
        assert!(files.load_recent().is_empty());
    }

    #[test]
    fn save_creates_dir_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let files = PlaylistFiles::new(dir.path().join("playlists"));

        let mut lists = Playlists::new();
        lists.insert(
            "Road Trip".into(),
            vec![FileReference::new(1, "/m/a.mp3", "a.mp3")],
        );
        files.save_playlists(&lists).unwrap();

        assert_eq!(files.load_playlists(), lists);
        assert!(!files.dir().join("playlists.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(RECENT_FILE), "[{\"path\": ").unwrap();
        fs::write(dir.path().join(PLAYLISTS_FILE), "[]").unwrap();

        let files = PlaylistFiles::new(dir.path());
        assert!(files.load_recent().is_empty());
        assert!(files.load_playlists().is_empty());
    }
}
