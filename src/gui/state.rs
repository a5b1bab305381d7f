//! GUI state + messages.
//! Pure data definitions used by update/ + view/.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::core::playback::{PlaybackController, PlayerEvent, StreamLoader};
use crate::core::playlist::PlaylistStore;
use crate::core::remote::PanClient;
use crate::core::types::{FileReference, PlayMode, TrackMetadata, TransportState};

/// Long-lived handles built in main() before the UI starts.
#[derive(Clone)]
pub(crate) struct Services {
    pub store: Arc<PlaylistStore>,
    pub loader: StreamLoader,
    pub client: Arc<PanClient>,
    pub poll_interval: Duration,
}

/// What the center list is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ListSource {
    Playlist(String),
    Recent,
}

/// App state
pub(crate) struct Nimbus {
    pub services: Services,
    pub status: String,
    pub account: Option<String>,

    // Playback engine (started on first use)
    pub playback: Option<PlaybackController>,
    pub playback_events: Option<RefCell<Receiver<PlayerEvent>>>,

    // Sidebar
    pub playlist_names: Vec<String>,
    pub new_playlist_name: String,
    pub rename_input: String,
    pub import_path: String,

    // Center list
    pub source: Option<ListSource>,
    pub tracks: Vec<FileReference>,
    pub selected_track: Option<usize>,
    pub validity: HashMap<String, bool>,
    pub checking: bool,

    // Now playing (mirrors engine events/snapshots)
    pub transport: TransportState,
    pub play_mode: PlayMode,
    pub now_playing: Option<FileReference>,
    pub metadata: Option<TrackMetadata>,
    pub position: f32,
    pub length_ms: u64,
    pub volume: u8,
    pub seek_preview: Option<f32>,
    pub level: f32,
}

impl Nimbus {
    pub(crate) fn new(services: Services) -> Self {
        let playlist_names = services.store.get_all_playlists().into_keys().collect();

        Self {
            services,
            status: "Pick a playlist, or create one.".to_string(),
            account: None,

            playback: None,
            playback_events: None,

            playlist_names,
            new_playlist_name: String::new(),
            rename_input: String::new(),
            import_path: String::new(),

            source: None,
            tracks: Vec::new(),
            selected_track: None,
            validity: HashMap::new(),
            checking: false,

            transport: TransportState::Stopped,
            play_mode: PlayMode::Sequential,
            now_playing: None,
            metadata: None,
            position: 0.0,
            length_ms: 0,
            volume: 100,
            seek_preview: None,
            level: 0.0,
        }
    }

    pub(crate) fn selected_playlist(&self) -> Option<&str> {
        match &self.source {
            Some(ListSource::Playlist(name)) => Some(name),
            _ => None,
        }
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.transport == TransportState::Playing
    }
}

/// Message = “something happened”.
#[derive(Debug, Clone)]
pub(crate) enum Message {
    TickPlayback,
    UserInfoLoaded(Result<String, String>),

    // Playlists
    NewPlaylistNameChanged(String),
    CreatePlaylist,
    RenameInputChanged(String),
    RenamePlaylist,
    DeletePlaylist,
    SelectPlaylist(String),
    SelectRecent,

    // Import provider listing JSON into the selected playlist
    ImportPathChanged(String),
    ImportListing,
    ImportFinished(Result<Vec<FileReference>, String>),

    // Track list
    SelectTrack(usize),
    PlayTrack(usize),
    RemoveTrack(usize),
    MoveTrack { from: usize, to: usize },
    CheckValidity,
    ValidityChecked(Vec<(String, bool)>),

    // Transport
    TogglePlayPause,
    Stop,
    Next,
    Prev,
    CycleMode,

    // Seek: preview vs commit
    SeekTo(f32),
    SeekCommit,

    SetVolume(f32),
}
