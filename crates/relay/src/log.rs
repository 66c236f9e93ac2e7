use std::collections::VecDeque;

use tgcord_common::Platform;

use crate::message::RelayedMessage;

/// Default correlation-window size.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Bounded, insertion-ordered window of relayed messages.
///
/// Replies, edits, and deletes on one platform are resolved against this
/// window to find the counterpart message on the other platform. Lookups
/// outside the window return `None`, a deliberate best-effort policy:
/// stale edits/deletes become no-ops and stale reply links are omitted.
///
/// Entries are never removed on delete; a deleted message must stay
/// resolvable as a reply target for as long as the window retains it.
#[derive(Debug)]
pub struct CorrelationLog {
    entries: VecDeque<RelayedMessage>,
    capacity: usize,
}

impl CorrelationLog {
    /// `capacity` of zero is clamped to one; an empty window could never
    /// correlate anything.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append at the tail, evicting from the head while over capacity.
    pub fn append(&mut self, message: RelayedMessage) {
        self.entries.push_back(message);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// First entry whose native id on `platform` equals `id`. Linear scan
    /// over the current window; `None` means outside the window or never
    /// relayed, which callers treat as a no-op rather than an error.
    #[must_use]
    pub fn find_by_native_id(&self, platform: Platform, id: &str) -> Option<&RelayedMessage> {
        self.entries
            .iter()
            .find(|m| m.native_id(platform) == Some(id))
    }

    /// In-place content update for the entry matching (`platform`, `id`).
    /// Id fields are never touched. Returns `false` on a correlation miss.
    pub fn update_content(&mut self, platform: Platform, id: &str, new_content: &str) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|m| m.native_id(platform) == Some(id))
        {
            Some(entry) => {
                entry.content = new_content.to_owned();
                true
            },
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CorrelationLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        tgcord_common::{Attachments, Author},
    };

    fn entry(n: usize) -> RelayedMessage {
        RelayedMessage {
            source: Platform::Discord,
            portal: "240".into(),
            discord_id: Some(format!("d{n}")),
            telegram_id: Some(format!("t{n}")),
            content: format!("message {n}"),
            discord_reply_to: None,
            telegram_reply_to: None,
            author: Author::new("u1", "alice"),
            attachments: Attachments::default(),
        }
    }

    #[test]
    fn find_by_either_id_within_window() {
        let mut log = CorrelationLog::new(10);
        for n in 0..5 {
            log.append(entry(n));
        }
        for n in 0..5 {
            assert!(log.find_by_native_id(Platform::Discord, &format!("d{n}")).is_some());
            assert!(log.find_by_native_id(Platform::Telegram, &format!("t{n}")).is_some());
        }
        assert!(log.find_by_native_id(Platform::Discord, "d99").is_none());
    }

    #[test]
    fn fifo_eviction_past_capacity() {
        let mut log = CorrelationLog::new(3);
        for n in 0..4 {
            log.append(entry(n));
        }
        assert_eq!(log.len(), 3);
        // Oldest entry is gone by both ids.
        assert!(log.find_by_native_id(Platform::Discord, "d0").is_none());
        assert!(log.find_by_native_id(Platform::Telegram, "t0").is_none());
        // The three most recent remain.
        for n in 1..4 {
            assert!(log.find_by_native_id(Platform::Discord, &format!("d{n}")).is_some());
        }
    }

    #[test]
    fn update_content_mutates_in_place() {
        let mut log = CorrelationLog::new(10);
        log.append(entry(0));

        assert!(log.update_content(Platform::Telegram, "t0", "edited"));
        let found = log.find_by_native_id(Platform::Discord, "d0");
        assert!(found.is_some_and(|m| m.content == "edited"));
        // Ids unchanged.
        assert!(found.is_some_and(|m| m.telegram_id.as_deref() == Some("t0")));
    }

    #[test]
    fn update_content_miss_is_false() {
        let mut log = CorrelationLog::new(10);
        assert!(!log.update_content(Platform::Discord, "nope", "x"));
    }

    #[test]
    fn zero_capacity_clamped() {
        let mut log = CorrelationLog::new(0);
        log.append(entry(0));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn partial_entries_match_only_known_side() {
        let mut log = CorrelationLog::new(10);
        let mut partial = entry(0);
        partial.telegram_id = None;
        log.append(partial);

        assert!(log.find_by_native_id(Platform::Discord, "d0").is_some());
        assert!(log.find_by_native_id(Platform::Telegram, "t0").is_none());
    }
}
