//! Left sidebar (account, playlists, recent, import).

use iced::Length;
use iced::widget::{button, column, container, row, scrollable, text, text_input};

use super::super::state::{ListSource, Message, Nimbus};

pub(crate) fn build_sidebar(state: &Nimbus) -> iced::widget::Container<'_, Message> {
    let account = match &state.account {
        Some(name) => format!("Signed in as {name}"),
        None => "Not signed in".to_string(),
    };

    let name_input = text_input("New playlist name", &state.new_playlist_name)
        .on_input(Message::NewPlaylistNameChanged)
        .on_submit(Message::CreatePlaylist)
        .width(Length::Fill);
    let create_row = row![name_input, button("Create").on_press(Message::CreatePlaylist)].spacing(8);

    let mut lists = column![];
    for name in &state.playlist_names {
        let is_selected = state.selected_playlist() == Some(name.as_str());
        let label = if is_selected {
            format!("✓ {name}")
        } else {
            name.clone()
        };
        lists = lists.push(
            button(text(label))
                .on_press(Message::SelectPlaylist(name.clone()))
                .width(Length::Fill),
        );
    }
    let lists_panel = scrollable(lists.spacing(6)).height(Length::Fixed(220.0));

    let recent_label = if state.source == Some(ListSource::Recent) {
        "✓ Recently played"
    } else {
        "Recently played"
    };
    let recent_btn = button(recent_label)
        .on_press(Message::SelectRecent)
        .width(Length::Fill);

    let has_selection = state.selected_playlist().is_some();

    let rename_input = text_input("Rename to", &state.rename_input)
        .on_input(Message::RenameInputChanged)
        .on_submit(Message::RenamePlaylist)
        .width(Length::Fill);
    let manage_row = row![
        button("Rename").on_press_maybe(has_selection.then_some(Message::RenamePlaylist)),
        button("Delete").on_press_maybe(has_selection.then_some(Message::DeletePlaylist)),
    ]
    .spacing(8);

    let import_input = text_input("Listing JSON path", &state.import_path)
        .on_input(Message::ImportPathChanged)
        .on_submit(Message::ImportListing)
        .width(Length::Fill);
    let import_row = row![
        import_input,
        button("Import").on_press_maybe(has_selection.then_some(Message::ImportListing)),
    ]
    .spacing(8);

    let col = column![
        text("Nimbus").size(20),
        text(account).size(12),
        text(&state.status).size(12),
        text("Playlists").size(16),
        create_row,
        lists_panel,
        recent_btn,
        text("Selected playlist").size(16),
        rename_input,
        manage_row,
        import_row,
    ]
    .spacing(12);

    container(scrollable(col).height(Length::Fill)).padding(12)
}
