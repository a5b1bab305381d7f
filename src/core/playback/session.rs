//! core/playback/session.rs
//! The single "now playing" context and the track-advance rules.
//!
//! Only `PlaybackEngine` holds a `PlaybackSession`. Everybody else sees
//! `SessionSnapshot` clones.

use rand::Rng;

use crate::core::types::{FileReference, PlayMode, TrackMetadata, TransportState};

pub const MAX_VOLUME: u8 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub current_file: Option<FileReference>,
    pub working_playlist: Vec<FileReference>,
    /// Valid (`< working_playlist.len()`) whenever state is Playing or Paused.
    pub current_index: Option<usize>,
    pub play_mode: PlayMode,
    pub state: TransportState,
    pub volume: u8,
    /// Last observed normalized position, 0.0..=1.0.
    pub position: f32,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            current_file: None,
            working_playlist: Vec::new(),
            current_index: None,
            play_mode: PlayMode::Sequential,
            state: TransportState::Stopped,
            volume: MAX_VOLUME,
            position: 0.0,
        }
    }
}

impl PlaybackSession {
    /// Index of `file` in the working playlist, matched by path.
    pub fn index_of(&self, file: &FileReference) -> Option<usize> {
        self.working_playlist.iter().position(|f| f.path == file.path)
    }
}

/// Read-only copy handed to the UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub session: PlaybackSession,
    pub length_ms: u64,
    pub metadata: Option<TrackMetadata>,
}

/// Which way an advance goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Pick the index to play after `current` in a playlist of `len` entries.
///
/// - Sequential: +1 / -1, wrapping at both ends
/// - SingleRepeat: same index (both directions restart the current track)
/// - Random: uniform over all indices except `current`; len 1 repeats
///
/// `current == None` means nothing is positioned yet: next starts at 0,
/// previous starts at the last entry. Returns None for an empty playlist.
pub fn advance_index(
    mode: PlayMode,
    direction: Direction,
    current: Option<usize>,
    len: usize,
    rng: &mut impl Rng,
) -> Option<usize> {
    if len == 0 {
        return None;
    }

    // A stale index (playlist replaced underneath) counts as "not positioned".
    let current = current.filter(|&i| i < len);

    let index = match mode {
        PlayMode::Sequential => sequential(direction, current, len),
        PlayMode::SingleRepeat => match current {
            Some(i) => i,
            None => sequential(direction, None, len),
        },
        PlayMode::Random => random_other(current, len, rng),
    };

    Some(index)
}

fn sequential(direction: Direction, current: Option<usize>, len: usize) -> usize {
    match (direction, current) {
        (Direction::Next, None) => 0,
        (Direction::Previous, None) => len - 1,
        (Direction::Next, Some(i)) => (i + 1) % len,
        (Direction::Previous, Some(i)) => (i + len - 1) % len,
    }
}

fn random_other(current: Option<usize>, len: usize, rng: &mut impl Rng) -> usize {
    match current {
        Some(_) if len == 1 => 0,
        Some(cur) => {
            // Draw from len-1 slots and skip over `cur`: uniform, never equal.
            let pick = rng.random_range(0..len - 1);
            if pick >= cur { pick + 1 } else { pick }
        }
        None => rng.random_range(0..len),
    }
}
