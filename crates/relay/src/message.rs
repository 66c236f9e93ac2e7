use tgcord_common::{Attachments, Author, Platform};

/// A normalized inbound event, produced by a platform adapter before any
/// relay decisions are made.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub source: Platform,
    /// Source-native channel id: a Discord channel id or a Telegram forum
    /// topic id. Empty when the platform event carries none (e.g. a
    /// Telegram message outside any topic); such events never map to a
    /// portal and are dropped.
    pub channel: String,
    /// Message id assigned by the source platform.
    pub native_id: String,
    pub content: String,
    /// Source-native id of the message this one replies to, if any.
    pub reply_to: Option<String>,
    pub author: Author,
    /// True for bot, webhook, or otherwise automated authors. Relaying
    /// these would re-ingest our own mirrors and loop forever.
    pub from_automated: bool,
    pub attachments: Attachments,
}

/// The canonical record of one relayed message.
///
/// Exactly one native id is set when the record is built from an inbound
/// event; the other is filled in once the outbound send completes. A
/// failed send leaves it `None` permanently; there are no retries, and
/// later edits/deletes targeting the missing side degrade to no-ops.
#[derive(Debug, Clone)]
pub struct RelayedMessage {
    pub source: Platform,
    /// Destination channel/topic id (already portal-mapped).
    pub portal: String,
    pub discord_id: Option<String>,
    pub telegram_id: Option<String>,
    /// Message body, already transcoded for the destination platform.
    pub content: String,
    pub discord_reply_to: Option<String>,
    pub telegram_reply_to: Option<String>,
    /// The original sender. Never a proxy identity.
    pub author: Author,
    pub attachments: Attachments,
}

impl RelayedMessage {
    /// This message's id on the given platform, if known.
    #[must_use]
    pub fn native_id(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Discord => self.discord_id.as_deref(),
            Platform::Telegram => self.telegram_id.as_deref(),
        }
    }

    pub fn set_native_id(&mut self, platform: Platform, id: String) {
        match platform {
            Platform::Discord => self.discord_id = Some(id),
            Platform::Telegram => self.telegram_id = Some(id),
        }
    }

    /// The reply-target id on the given platform, if resolved.
    #[must_use]
    pub fn reply_to(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Discord => self.discord_reply_to.as_deref(),
            Platform::Telegram => self.telegram_reply_to.as_deref(),
        }
    }

    pub fn set_reply_to(&mut self, platform: Platform, id: String) {
        match platform {
            Platform::Discord => self.discord_reply_to = Some(id),
            Platform::Telegram => self.telegram_reply_to = Some(id),
        }
    }
}
