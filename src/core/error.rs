//! core/error.rs
//! Error types for the core, one enum per concern.

use thiserror::Error;

/// A remote lookup could not produce a playable URL.
///
/// Callers treat every variant the same way ("resolution failed"); the
/// variants only exist so the log line says why.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no access token configured")]
    Unauthenticated,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API error {errno}: {message}")]
    Api { errno: i64, message: String },

    #[error("no download link for file {0}")]
    MissingLink(u64),
}

/// Audio output / decode failures inside the playback engine.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("audio output unavailable: {0}")]
    Output(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("stream download failed: {0}")]
    Fetch(String),

    #[error("no media loaded")]
    NoMedia,
}

/// Playlist store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("playlist not found: {0}")]
    NotFound(String),

    #[error("playlist already exists: {0}")]
    AlreadyExists(String),

    #[error("index out of range: {index} (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("persistence failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}
