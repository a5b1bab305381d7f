//! gui/update/playlists.rs
//! Sidebar + track list handlers backed by the PlaylistStore.
//!
//! Store calls that only touch memory/disk run inline. Anything that can hit
//! the network (validity checks) goes through spawn_blocking.

use std::path::PathBuf;

use iced::Task;

use super::super::state::{ListSource, Message, Nimbus};
use super::super::util::parse_listing;
use super::util::spawn_blocking;
use crate::core::types::FileReference;

pub(crate) fn new_name_changed(state: &mut Nimbus, s: String) -> Task<Message> {
    state.new_playlist_name = s;
    Task::none()
}

pub(crate) fn rename_input_changed(state: &mut Nimbus, s: String) -> Task<Message> {
    state.rename_input = s;
    Task::none()
}

pub(crate) fn import_path_changed(state: &mut Nimbus, s: String) -> Task<Message> {
    state.import_path = s;
    Task::none()
}

pub(crate) fn create(state: &mut Nimbus) -> Task<Message> {
    let name = state.new_playlist_name.trim().to_string();
    if name.is_empty() {
        return Task::none();
    }

    match state.services.store.create_playlist(&name) {
        Ok(()) => {
            state.new_playlist_name.clear();
            state.status = format!("Created playlist '{name}'.");
            refresh_names(state);
            select(state, ListSource::Playlist(name))
        }
        Err(e) => {
            state.status = format!("Create failed: {e}");
            Task::none()
        }
    }
}

pub(crate) fn rename(state: &mut Nimbus) -> Task<Message> {
    let Some(old) = state.selected_playlist().map(str::to_owned) else {
        state.status = "Select a playlist to rename.".into();
        return Task::none();
    };
    let new = state.rename_input.trim().to_string();
    if new.is_empty() || new == old {
        return Task::none();
    }

    match state.services.store.rename_playlist(&old, &new) {
        Ok(()) => {
            state.rename_input.clear();
            state.status = format!("Renamed '{old}' to '{new}'.");
            state.source = Some(ListSource::Playlist(new));
            refresh_names(state);
        }
        Err(e) => state.status = format!("Rename failed: {e}"),
    }
    Task::none()
}

pub(crate) fn delete(state: &mut Nimbus) -> Task<Message> {
    let Some(name) = state.selected_playlist().map(str::to_owned) else {
        state.status = "Select a playlist to delete.".into();
        return Task::none();
    };

    match state.services.store.delete_playlist(&name) {
        Ok(()) => {
            state.status = format!("Deleted playlist '{name}'.");
            state.source = None;
            state.tracks.clear();
            state.selected_track = None;
            refresh_names(state);
        }
        Err(e) => state.status = format!("Delete failed: {e}"),
    }
    Task::none()
}

pub(crate) fn select(state: &mut Nimbus, source: ListSource) -> Task<Message> {
    let tracks = match &source {
        ListSource::Playlist(name) => match state.services.store.get_playlist(name) {
            Some(tracks) => tracks,
            None => {
                state.status = format!("Playlist '{name}' not found.");
                refresh_names(state);
                return Task::none();
            }
        },
        ListSource::Recent => state.services.store.get_recent_played(),
    };

    if let ListSource::Playlist(name) = &source {
        state.rename_input = name.clone();
    }

    state.source = Some(source);
    state.tracks = tracks;
    state.selected_track = None;
    refresh_cached_validity(state);
    Task::none()
}

pub(crate) fn select_track(state: &mut Nimbus, index: usize) -> Task<Message> {
    if index < state.tracks.len() {
        state.selected_track = Some(index);
    }
    Task::none()
}

pub(crate) fn remove_track(state: &mut Nimbus, index: usize) -> Task<Message> {
    let Some(name) = state.selected_playlist().map(str::to_owned) else {
        return Task::none();
    };

    match state.services.store.remove_from_playlist(&name, &[index]) {
        Ok(_) => reload_current(state),
        Err(e) => state.status = format!("Remove failed: {e}"),
    }
    Task::none()
}

pub(crate) fn move_track(state: &mut Nimbus, from: usize, to: usize) -> Task<Message> {
    let Some(name) = state.selected_playlist().map(str::to_owned) else {
        return Task::none();
    };

    match state.services.store.reorder_playlist(&name, from, to) {
        Ok(()) => {
            reload_current(state);
            state.selected_track = Some(to);
        }
        Err(e) => state.status = format!("Move failed: {e}"),
    }
    Task::none()
}

pub(crate) fn import_listing(state: &mut Nimbus) -> Task<Message> {
    if state.selected_playlist().is_none() {
        state.status = "Select a playlist to import into.".into();
        return Task::none();
    }
    let path = PathBuf::from(state.import_path.trim());
    if path.as_os_str().is_empty() {
        return Task::none();
    }

    Task::perform(
        spawn_blocking(move || {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| format!("could not read {}: {e}", path.display()))?;
            parse_listing(&text)
        }),
        |result| {
            Message::ImportFinished(
                result.unwrap_or_else(|| Err("import worker stopped".to_string())),
            )
        },
    )
}

pub(crate) fn import_finished(
    state: &mut Nimbus,
    result: Result<Vec<FileReference>, String>,
) -> Task<Message> {
    let files = match result {
        Ok(files) => files,
        Err(e) => {
            state.status = format!("Import failed: {e}");
            return Task::none();
        }
    };

    let Some(name) = state.selected_playlist().map(str::to_owned) else {
        return Task::none();
    };

    match state.services.store.add_to_playlist(&name, &files) {
        Ok(added) => {
            state.import_path.clear();
            state.status = format!(
                "Added {added} of {} file(s) to '{name}'.",
                files.len()
            );
            reload_current(state);
        }
        Err(e) => state.status = format!("Import failed: {e}"),
    }
    Task::none()
}

pub(crate) fn check_validity(state: &mut Nimbus) -> Task<Message> {
    if state.checking || state.tracks.is_empty() {
        return Task::none();
    }
    state.checking = true;
    state.status = format!("Checking {} file(s)...", state.tracks.len());

    let store = state.services.store.clone();
    let files = state.tracks.clone();

    Task::perform(
        spawn_blocking(move || {
            files
                .iter()
                .map(|f| (f.path.clone(), store.check_file_validity(f)))
                .collect::<Vec<_>>()
        }),
        |result| Message::ValidityChecked(result.unwrap_or_default()),
    )
}

pub(crate) fn validity_checked(state: &mut Nimbus, results: Vec<(String, bool)>) -> Task<Message> {
    state.checking = false;
    let invalid = results.iter().filter(|(_, ok)| !ok).count();
    state.status = match invalid {
        0 => format!("All {} file(s) are available.", results.len()),
        n => format!("{n} of {} file(s) are unavailable.", results.len()),
    };
    state.validity.extend(results);
    Task::none()
}

pub(crate) fn load_user_info(state: &Nimbus) -> Task<Message> {
    let client = state.services.client.clone();
    Task::perform(
        spawn_blocking(move || {
            client
                .user_info()
                .map(|info| info.display_name().to_string())
                .map_err(|e| e.to_string())
        }),
        |result| {
            Message::UserInfoLoaded(result.unwrap_or_else(|| Err("worker stopped".to_string())))
        },
    )
}

pub(crate) fn user_info_loaded(state: &mut Nimbus, result: Result<String, String>) -> Task<Message> {
    match result {
        Ok(name) => state.account = Some(name),
        Err(e) => {
            tracing::warn!("account lookup failed: {e}");
            state.account = None;
            state.status = format!("Not signed in: {e}");
        }
    }
    Task::none()
}

fn refresh_names(state: &mut Nimbus) {
    state.playlist_names = state
        .services
        .store
        .get_all_playlists()
        .into_keys()
        .collect();
}

fn reload_current(state: &mut Nimbus) {
    let tracks = match &state.source {
        Some(ListSource::Playlist(name)) => state.services.store.get_playlist(name),
        Some(ListSource::Recent) => Some(state.services.store.get_recent_played()),
        None => None,
    };
    state.tracks = tracks.unwrap_or_default();
    if state.selected_track.is_some_and(|i| i >= state.tracks.len()) {
        state.selected_track = None;
    }
    refresh_cached_validity(state);
}

/// Markers from the cache only; no network.
fn refresh_cached_validity(state: &mut Nimbus) {
    for file in &state.tracks {
        if let Some(valid) = state.services.store.cached_validity(&file.path) {
            state.validity.insert(file.path.clone(), valid);
        }
    }
}
