//! Playback bar.

use iced::widget::{button, column, container, progress_bar, row, slider, text};
use iced::{Alignment, Length};

use super::super::state::{Message, Nimbus};
use super::super::util::fmt_duration;
use super::constants::LEVEL_W;

/// Bottom playback bar.
///
/// Emits only Messages (no rodio, no decoding).
pub(crate) fn playback_bar(state: &Nimbus) -> iced::widget::Container<'_, Message> {
    let play_label = if state.is_playing() { "Pause" } else { "Play" };

    let prev_btn = button("⏮").on_press(Message::Prev);
    let play_btn = button(play_label).on_press(Message::TogglePlayPause);
    let stop_btn = button("⏹").on_press(Message::Stop);
    let next_btn = button("⏭").on_press(Message::Next);
    let mode_btn = button(text(state.play_mode.label()).size(12)).on_press(Message::CycleMode);

    // --- seek slider (normalized) ---
    let shown = state.seek_preview.unwrap_or(state.position).clamp(0.0, 1.0);
    let seek = slider(0.0..=1.0, shown, Message::SeekTo)
        .step(0.001)
        .on_release(Message::SeekCommit)
        .width(Length::Fill);

    let time_text = if state.length_ms > 0 {
        let pos_ms = (f64::from(shown) * state.length_ms as f64).round() as u64;
        format!("{} / {}", fmt_duration(pos_ms), fmt_duration(state.length_ms))
    } else {
        "-:-- / -:--".to_string()
    };

    // --- volume slider (0..=100) ---
    let vol_slider = slider(0.0..=100.0, f32::from(state.volume), Message::SetVolume)
        .step(1.0)
        .width(Length::Fixed(140.0));

    // --- now playing label ---
    let now_playing = match (&state.metadata, &state.now_playing) {
        (Some(m), Some(_)) => format!("{} — {} ({})", m.title, m.artist, m.album),
        (None, Some(f)) => f.name.clone(),
        _ => "Nothing playing".into(),
    };

    let level = container(progress_bar(0.0..=1.0, state.level)).width(Length::Fixed(LEVEL_W));

    let bar = row![
        // left: transport
        row![prev_btn, play_btn, stop_btn, next_btn, mode_btn]
            .spacing(8)
            .align_y(Alignment::Center),
        // middle: now playing + seek
        column![
            text(now_playing).size(14),
            row![seek, text(time_text).size(12)]
                .spacing(10)
                .align_y(Alignment::Center),
        ]
        .spacing(6)
        .width(Length::Fill),
        // right: level + volume
        row![level, text("Vol").size(12), vol_slider]
            .spacing(8)
            .align_y(Alignment::Center),
    ]
    .spacing(16)
    .align_y(Alignment::Center);

    container(bar).padding(12)
}
