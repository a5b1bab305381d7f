//! Track view (table list) for the selected playlist or the history.

use iced::widget::{Column, button, column, container, mouse_area, row, scrollable, text};
use iced::{Alignment, Length};

use super::super::state::{ListSource, Message, Nimbus};
use super::super::util::fmt_size;
use super::constants::{
    HEADER_TEXT, ROW_TEXT, TRACK_LIST_SPACING, TRACK_ROW_H, TRACK_ROW_HPAD, TRACK_ROW_VPAD,
};

pub(crate) fn build_tracks_center(state: &Nimbus) -> Column<'_, Message> {
    let title = match &state.source {
        Some(ListSource::Playlist(name)) => name.clone(),
        Some(ListSource::Recent) => "Recently played".to_string(),
        None => "No playlist selected".to_string(),
    };

    let check_btn = if state.checking {
        button("Checking...")
    } else {
        button("Check availability").on_press_maybe(
            (!state.tracks.is_empty()).then_some(Message::CheckValidity),
        )
    };

    column![
        row![text(title).size(18).width(Length::Fill), check_btn]
            .spacing(12)
            .align_y(Alignment::Center),
        build_tracks_table(state).height(Length::Fill),
    ]
    .spacing(12)
}

fn build_tracks_table(state: &Nimbus) -> iced::widget::Scrollable<'_, Message> {
    let editable = state.selected_playlist().is_some();

    let header = row![
        text("").size(HEADER_TEXT).width(Length::Fixed(24.0)),
        text("").size(HEADER_TEXT).width(Length::Fixed(24.0)),
        text("Name").size(HEADER_TEXT).width(Length::Fill),
        text("Size").size(HEADER_TEXT).width(Length::Fixed(90.0)),
        text("").size(HEADER_TEXT).width(Length::Fixed(150.0)),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let mut col = column![header].spacing(TRACK_LIST_SPACING);
    let now_playing = state.now_playing.as_ref().map(|f| f.path.as_str());
    let last = state.tracks.len().saturating_sub(1);

    for (i, t) in state.tracks.iter().enumerate() {
        // Now playing gets ▶. Selected row gets ●.
        let marker = if now_playing == Some(t.path.as_str()) {
            "▶"
        } else if state.selected_track == Some(i) {
            "●"
        } else {
            ""
        };

        let validity = match state.validity.get(&t.path) {
            Some(true) => "✓",
            Some(false) => "✗",
            None => "",
        };

        let mut actions = row![button(text("Play").size(ROW_TEXT)).on_press(Message::PlayTrack(i))]
            .spacing(4);
        if editable {
            actions = actions
                .push(
                    button(text("↑").size(ROW_TEXT)).on_press_maybe(
                        (i > 0).then(|| Message::MoveTrack { from: i, to: i - 1 }),
                    ),
                )
                .push(
                    button(text("↓").size(ROW_TEXT)).on_press_maybe(
                        (i < last).then(|| Message::MoveTrack { from: i, to: i + 1 }),
                    ),
                )
                .push(button(text("×").size(ROW_TEXT)).on_press(Message::RemoveTrack(i)));
        }

        let row_cells = row![
            text(marker).size(ROW_TEXT).width(Length::Fixed(24.0)),
            text(validity).size(ROW_TEXT).width(Length::Fixed(24.0)),
            text(&t.name).size(ROW_TEXT).width(Length::Fill),
            text(fmt_size(t.size)).size(ROW_TEXT).width(Length::Fixed(90.0)),
            container(actions).width(Length::Fixed(150.0)),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let row_widget = mouse_area(
            container(row_cells)
                .padding([TRACK_ROW_VPAD, TRACK_ROW_HPAD])
                .height(Length::Fixed(TRACK_ROW_H))
                .width(Length::Fill),
        )
        .on_press(Message::SelectTrack(i));

        col = col.push(row_widget);
    }

    scrollable(col).height(Length::Fill)
}
