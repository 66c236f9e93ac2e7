use std::collections::HashMap;

use tgcord_common::Platform;

/// Static bidirectional lookup between paired Discord channels and
/// Telegram forum topics. Built once at startup, immutable afterwards.
#[derive(Debug, Default)]
pub struct PortalMap {
    by_discord: HashMap<String, String>,
    by_telegram: HashMap<String, String>,
}

impl PortalMap {
    /// Build from (discord channel, telegram topic) pairs. Later pairs win
    /// on duplicate ids; config validation rejects duplicates upstream.
    #[must_use]
    pub fn from_pairs<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let mut map = Self::default();
        for (discord, telegram) in pairs {
            let (discord, telegram) = (discord.into(), telegram.into());
            map.by_discord.insert(discord.clone(), telegram.clone());
            map.by_telegram.insert(telegram, discord);
        }
        map
    }

    /// Map a source-native channel id to the paired channel on the other
    /// platform. `None` means the event belongs to no portal and is
    /// ignored by the relay.
    #[must_use]
    pub fn resolve_destination(&self, source: Platform, channel: &str) -> Option<&str> {
        let map = match source {
            Platform::Discord => &self.by_discord,
            Platform::Telegram => &self.by_telegram,
        };
        map.get(channel).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_discord.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_discord.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_both_directions() {
        let map = PortalMap::from_pairs([("chan-en", "240"), ("chan-ru", "3")]);

        assert_eq!(map.resolve_destination(Platform::Discord, "chan-en"), Some("240"));
        assert_eq!(map.resolve_destination(Platform::Telegram, "240"), Some("chan-en"));
        assert_eq!(map.resolve_destination(Platform::Discord, "chan-ru"), Some("3"));
        assert_eq!(map.resolve_destination(Platform::Telegram, "3"), Some("chan-ru"));
    }

    #[test]
    fn unknown_channel_has_no_portal() {
        let map = PortalMap::from_pairs([("chan-en", "240")]);
        assert_eq!(map.resolve_destination(Platform::Discord, "other"), None);
        assert_eq!(map.resolve_destination(Platform::Telegram, "999"), None);
        assert_eq!(map.resolve_destination(Platform::Telegram, ""), None);
    }

    #[test]
    fn empty_map() {
        let map = PortalMap::from_pairs(Vec::<(String, String)>::new());
        assert!(map.is_empty());
        assert_eq!(map.resolve_destination(Platform::Discord, "x"), None);
    }
}
