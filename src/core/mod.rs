//! core/mod.rs
//!
//! The brain of the app:
//! - Resolve remote files to playable streams (remote)
//! - Own the "now playing" session and drive the audio output (playback)
//! - Keep named playlists + recent history on disk, and know which files still resolve (playlist)
//! - Return plain data structs for the GUI to render
//!
//! Nothing in here imports iced. The GUI talks to playback through a
//! command channel and to the playlist store through `Arc<PlaylistStore>`.

pub mod config;
pub mod error;
pub mod metadata;
pub mod playback;
pub mod playlist;
pub mod remote;
pub mod types;

#[cfg(test)]
pub mod testing;
