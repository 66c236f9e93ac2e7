//! Shared types and media helpers used across all tgcord crates.

pub mod media;
pub mod types;

pub use types::{Attachment, AttachmentKind, Attachments, Author, Platform};
