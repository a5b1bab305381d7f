//! gui/subscription.rs
//! Poll playback events by emitting a periodic TickPlayback message.
//!
//! The engine never touches GUI state; events sit in the channel until
//! this tick drains them on the UI thread.

use iced::{Subscription, time};

use super::state::{Message, Nimbus};

pub(crate) fn subscription(state: &Nimbus) -> Subscription<Message> {
    if state.playback_events.is_none() {
        return Subscription::none();
    }

    time::every(state.services.poll_interval).map(|_| Message::TickPlayback)
}
