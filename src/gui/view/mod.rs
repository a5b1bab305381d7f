//! GUI renderer (reads state, produces widgets; no mutation).

mod constants;
mod sidebar;
mod tracks;
mod widgets;

use iced::Length;
use iced::widget::{Column, column, container, row};

use super::state::{Message, Nimbus};
use constants::{PLAYBACK_H, SIDEBAR_W};

pub(crate) fn view(state: &Nimbus) -> Column<'_, Message> {
    let playback = widgets::playback_bar(state).height(Length::Fixed(PLAYBACK_H));

    let sidebar = sidebar::build_sidebar(state).width(Length::Fixed(SIDEBAR_W));
    let main = container(tracks::build_tracks_center(state))
        .padding(12)
        .width(Length::Fill);

    let body = row![sidebar, main].spacing(12).height(Length::Fill);
    column![playback, body].spacing(12).padding(12)
}
