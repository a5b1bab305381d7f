//! gui/update/playback.rs
//! GUI-playback engine bridge
//!
//! Design goals:
//! - GUI never touches rodio/symphonia directly.
//! - The GUI mirrors the session from events + snapshots; the engine owns it.
//! - All IO / timing is driven by the engine + TickPlayback polling.

use iced::Task;

use super::super::state::{ListSource, Message, Nimbus};
use crate::core::playback::{MAX_VOLUME, PlayerCommand, PlayerEvent, start_playback};
use crate::core::types::TransportState;

fn ensure_engine(state: &mut Nimbus) {
    if state.playback.is_some() && state.playback_events.is_some() {
        return;
    }

    let (controller, events) = start_playback(
        state.services.loader.clone(),
        state.services.poll_interval,
    );
    controller.send(PlayerCommand::SetVolume(state.volume));
    controller.send(PlayerCommand::SetPlayMode(state.play_mode));

    state.playback = Some(controller);
    state.playback_events = Some(std::cell::RefCell::new(events));
}

fn send(state: &mut Nimbus, cmd: PlayerCommand) {
    ensure_engine(state);
    if let Some(controller) = &state.playback {
        controller.send(cmd);
    }
}

pub(crate) fn drain_events(state: &mut Nimbus) -> Task<Message> {
    let Some(rx_cell) = state.playback_events.as_ref() else {
        return Task::none();
    };

    let mut drained: Vec<PlayerEvent> = Vec::new();
    {
        // Receiver::try_recv only needs &self, so borrow() is enough.
        let rx = rx_cell.borrow();
        while let Ok(ev) = rx.try_recv() {
            drained.push(ev);
        }
    }

    for ev in drained {
        handle_event(state, ev);
    }

    if let Some(controller) = &state.playback {
        state.length_ms = controller.get_length();
        state.metadata = controller.metadata();
        state.level = rms(&controller.audio_samples());
    }

    Task::none()
}

/// Play the visible list from `index`.
pub(crate) fn play_track(state: &mut Nimbus, index: usize) -> Task<Message> {
    if index >= state.tracks.len() {
        return Task::none();
    }

    let entries = state.tracks.clone();
    state.status = format!("Loading {}...", entries[index].name);
    state.selected_track = Some(index);
    state.seek_preview = None;

    send(
        state,
        PlayerCommand::SetPlaylist {
            entries,
            start_index: index,
        },
    );
    Task::none()
}

pub(crate) fn toggle_play_pause(state: &mut Nimbus) -> Task<Message> {
    if state.is_playing() {
        send(state, PlayerCommand::Pause);
        return Task::none();
    }

    if state.now_playing.is_some() {
        send(state, PlayerCommand::Play);
        return Task::none();
    }

    // Nothing loaded yet: start from the selection (or the top).
    let start = state.selected_track.unwrap_or(0);
    play_track(state, start)
}

pub(crate) fn stop(state: &mut Nimbus) -> Task<Message> {
    send(state, PlayerCommand::Stop);
    state.seek_preview = None;
    Task::none()
}

pub(crate) fn next(state: &mut Nimbus) -> Task<Message> {
    send(state, PlayerCommand::Next);
    Task::none()
}

pub(crate) fn prev(state: &mut Nimbus) -> Task<Message> {
    send(state, PlayerCommand::Previous);
    Task::none()
}

pub(crate) fn cycle_mode(state: &mut Nimbus) -> Task<Message> {
    state.play_mode = state.play_mode.cycle();
    let mode = state.play_mode;
    send(state, PlayerCommand::SetPlayMode(mode));
    state.status = format!("Mode: {}", mode.label());
    Task::none()
}

/// Seek slider changed: preview only (UI updates, no engine command).
pub(crate) fn seek_preview(state: &mut Nimbus, ratio: f32) -> Task<Message> {
    if state.now_playing.is_none() {
        return Task::none();
    }
    state.seek_preview = Some(ratio.clamp(0.0, 1.0));
    Task::none()
}

/// Seek slider released: commit the last preview to the engine.
pub(crate) fn seek_commit(state: &mut Nimbus) -> Task<Message> {
    let Some(ratio) = state.seek_preview.take() else {
        return Task::none();
    };

    send(state, PlayerCommand::Seek(ratio));

    // Optimistic UI update; engine confirms via PositionChanged.
    state.position = ratio;
    Task::none()
}

pub(crate) fn set_volume(state: &mut Nimbus, volume: f32) -> Task<Message> {
    let volume = volume.round().clamp(0.0, f32::from(MAX_VOLUME)) as u8;
    state.volume = volume;

    if let Some(controller) = &state.playback {
        controller.send(PlayerCommand::SetVolume(volume));
    }

    Task::none()
}

pub(crate) fn handle_event(state: &mut Nimbus, event: PlayerEvent) {
    match event {
        PlayerEvent::StateChanged(s) => {
            state.transport = s;
            if s == TransportState::Stopped {
                state.position = 0.0;
                state.level = 0.0;
            }
        }
        PlayerEvent::PositionChanged(p) => {
            // If user is dragging the seek slider, don't fight them.
            if state.seek_preview.is_none() {
                state.position = p;
            }
        }
        PlayerEvent::TrackChanged(file) => {
            tracing::info!(path = %file.path, "now playing");
            state.status = format!("Now playing: {}", file.name);
            state.position = 0.0;

            state.services.store.add_to_recent(file.clone());
            if state.source == Some(ListSource::Recent) {
                state.tracks = state.services.store.get_recent_played();
                state.selected_track = state.tracks.iter().position(|f| f.path == file.path);
            }

            state.now_playing = Some(file);
        }
        PlayerEvent::Error(err) => {
            tracing::warn!("playback error: {err}");
            state.status = format!("Playback error: {err}");
        }
    }
}

/// Root-mean-square of the tap, 0.0..=1.0.
fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt().clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_silence_and_full_scale() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(rms(&[0.0; 16]), 0.0);
        assert!((rms(&[1.0, -1.0, 1.0, -1.0]) - 1.0).abs() < 1e-6);
    }
}
