//! Nimbus: play audio stored on a cloud drive.
//!
//! main() wires the long-lived pieces together, then hands off to iced:
//! - settings (env + `.env` in the data dir)
//! - provider client + downloader
//! - playlist store + its revalidation thread
//!
//! The playback engine starts lazily on the first transport command.

mod core;
mod gui;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::core::config::Settings;
use crate::core::playback::StreamLoader;
use crate::core::playlist::{PlaylistStore, spawn_revalidation};
use crate::core::remote::{HttpFetcher, PanClient};
use gui::{Nimbus, Services, load_user_info, subscription, update, view};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;
    tracing::info!(data_dir = %settings.data_dir.display(), "starting");
    if settings.access_token.is_none() {
        tracing::warn!("NIMBUS_ACCESS_TOKEN is not set; remote files will not resolve");
    }

    // Blocking HTTP clients must be built outside the async runtime.
    let client = Arc::new(PanClient::new(
        settings.api_url.clone(),
        settings.access_token.clone(),
    )?);
    let fetcher = Arc::new(HttpFetcher::new()?);

    let store = Arc::new(PlaylistStore::open(
        settings.playlist_dir(),
        client.clone(),
        settings.url_check_interval,
    ));
    let revalidation = spawn_revalidation(store.clone(), settings.url_check_interval);

    let services = Services {
        store,
        loader: StreamLoader::new(client.clone(), fetcher),
        client,
        poll_interval: settings.poll_interval,
    };

    // `iced::application` glues together:
    // - boot (state + the account lookup task)
    // - update function (logic)
    // - view function (UI layout)
    let boot_services = services.clone();
    iced::application(
        move || {
            let state = Nimbus::new(boot_services.clone());
            let task = load_user_info(&state);
            (state, task)
        },
        update,
        view,
    )
    .title("Nimbus")
    .subscription(subscription)
    .run()?;

    revalidation.shutdown();
    drop(services);
    Ok(())
}
