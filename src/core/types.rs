//! core/types.rs
//! Core data types shared between core logic and the UI.
//!
//! Rule of thumb:
//! - These structs are boring bags of data
//! - No GUI code, no network code, no audio code
//!
//! `FileReference` is ONE remote audio file as the provider describes it.
//! It is copied by value into playlists, history and the playback session.

use serde::{Deserialize, Serialize};

/// A remote audio file.
///
/// Field names on the wire follow the provider's listing JSON, so records
/// written by older builds (and raw listing entries) deserialize unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileReference {
    /// Absolute remote path. Used as the identity key everywhere.
    pub path: String,

    /// Provider file id (`fs_id`), needed to ask for a download link.
    #[serde(rename = "fs_id")]
    pub id: u64,

    /// Display name (`server_filename`).
    #[serde(rename = "server_filename")]
    pub name: String,

    /// Size in bytes.
    #[serde(default)]
    pub size: u64,

    /// Last-modified unix timestamp (`server_mtime`).
    #[serde(rename = "server_mtime", default)]
    pub modified: i64,
}

impl FileReference {
    pub fn new(id: u64, path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id,
            name: name.into(),
            size: 0,
            modified: 0,
        }
    }
}

/// How the working playlist advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    #[default]
    Sequential,
    Random,
    SingleRepeat,
}

impl PlayMode {
    /// Cycle order used by the mode button: sequential -> random -> single -> sequential.
    pub fn cycle(self) -> Self {
        match self {
            PlayMode::Sequential => PlayMode::Random,
            PlayMode::Random => PlayMode::SingleRepeat,
            PlayMode::SingleRepeat => PlayMode::Sequential,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayMode::Sequential => "Sequential",
            PlayMode::Random => "Random",
            PlayMode::SingleRepeat => "Repeat one",
        }
    }
}

/// Transport state of the playback engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Tag metadata for the loaded track.
///
/// Missing tags fall back to the file's display name and "Unknown ..." labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
}
