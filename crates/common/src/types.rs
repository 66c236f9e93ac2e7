use serde::{Deserialize, Serialize};

/// One of the two bridged chat platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Discord,
    Telegram,
}

impl Platform {
    /// The platform a message from `self` is relayed to.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Discord => Self::Telegram,
            Self::Telegram => Self::Discord,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discord => write!(f, "discord"),
            Self::Telegram => write!(f, "telegram"),
        }
    }
}

/// Identity of an original message author, always platform-native.
///
/// Never the identity of a relay proxy; proxies are derived from this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl Author {
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar_url: None,
        }
    }
}

/// Coarse attachment category, shared by both platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Photo,
    Video,
    Audio,
    Document,
}

/// A single non-voice attachment, referenced by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub url: String,
}

/// Attachments carried by a relayed message.
///
/// A voice clip is exclusive with the media list on the sending side:
/// the relay sends the voice note when present, the media list otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachments {
    /// Voice note URL, when the message is a voice clip.
    pub voice: Option<String>,
    /// Ordered list of photo/video/audio/document attachments.
    pub media: Vec<Attachment>,
}

impl Attachments {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voice.is_none() && self.media.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involutive() {
        assert_eq!(Platform::Discord.opposite(), Platform::Telegram);
        assert_eq!(Platform::Telegram.opposite(), Platform::Discord);
        assert_eq!(Platform::Discord.opposite().opposite(), Platform::Discord);
    }

    #[test]
    fn empty_attachments() {
        assert!(Attachments::default().is_empty());
        let with_voice = Attachments {
            voice: Some("https://example.com/v.ogg".into()),
            media: Vec::new(),
        };
        assert!(!with_voice.is_empty());
    }
}
