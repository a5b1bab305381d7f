//! gui/mod.rs
//!
//! This folder contains ONLY frontend concerns:
//! - app state ('Nimbus')
//! - messages ('Message')
//! - update logic ('update()')
//! - view layout ('view()')
//! - subscriptions (polling playback events)
//! - small UI helpers ('util')

pub(crate) mod state;
pub(crate) mod subscription;
pub(crate) mod update;
pub(crate) mod util;
pub(crate) mod view;

// Re-export the entry points main.rs needs.
pub(crate) use state::{Nimbus, Services};
pub(crate) use subscription::subscription;
pub(crate) use update::{load_user_info, update};
pub(crate) use view::view;
