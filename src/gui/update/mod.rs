//! gui/update/mod.rs
//! Update logic (router).
//! Mutates state in response to `Message` events.

use iced::Task;

use super::state::{ListSource, Message, Nimbus};

mod playback;
mod playlists;
mod util;

pub(crate) use playlists::load_user_info;

pub(crate) fn update(state: &mut Nimbus, message: Message) -> Task<Message> {
    match message {
        Message::TickPlayback => playback::drain_events(state),
        Message::UserInfoLoaded(result) => playlists::user_info_loaded(state, result),

        // Playlists
        Message::NewPlaylistNameChanged(s) => playlists::new_name_changed(state, s),
        Message::CreatePlaylist => playlists::create(state),
        Message::RenameInputChanged(s) => playlists::rename_input_changed(state, s),
        Message::RenamePlaylist => playlists::rename(state),
        Message::DeletePlaylist => playlists::delete(state),
        Message::SelectPlaylist(name) => playlists::select(state, ListSource::Playlist(name)),
        Message::SelectRecent => playlists::select(state, ListSource::Recent),

        // Import
        Message::ImportPathChanged(s) => playlists::import_path_changed(state, s),
        Message::ImportListing => playlists::import_listing(state),
        Message::ImportFinished(result) => playlists::import_finished(state, result),

        // Track list
        Message::SelectTrack(i) => playlists::select_track(state, i),
        Message::PlayTrack(i) => playback::play_track(state, i),
        Message::RemoveTrack(i) => playlists::remove_track(state, i),
        Message::MoveTrack { from, to } => playlists::move_track(state, from, to),
        Message::CheckValidity => playlists::check_validity(state),
        Message::ValidityChecked(results) => playlists::validity_checked(state, results),

        // Transport
        Message::TogglePlayPause => playback::toggle_play_pause(state),
        Message::Stop => playback::stop(state),
        Message::Next => playback::next(state),
        Message::Prev => playback::prev(state),
        Message::CycleMode => playback::cycle_mode(state),

        // Seek: preview vs commit
        Message::SeekTo(ratio) => playback::seek_preview(state, ratio),
        Message::SeekCommit => playback::seek_commit(state),

        Message::SetVolume(vol) => playback::set_volume(state, vol),
    }
}
