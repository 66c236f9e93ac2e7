//! Telegram side of the bridge.
//!
//! Receives group/topic messages over long polling with the teloxide
//! library, normalizes them into relay events, and implements the outbound
//! adapter that mirrors messages from the other platform into forum
//! topics as HTML-formatted bot posts.

pub mod listener;
pub mod markdown;
pub mod outbound;

pub use {
    listener::{connect, start_polling},
    outbound::TelegramPortal,
};
