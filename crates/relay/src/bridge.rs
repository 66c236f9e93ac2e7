use std::sync::{Arc, Mutex};

use {
    tgcord_common::Platform,
    tracing::{debug, warn},
};

use crate::{
    adapter::PortalAdapter,
    log::CorrelationLog,
    message::{InboundMessage, RelayedMessage},
    portal::PortalMap,
    proxy::ProxyRegistry,
    transcode::ContentTranscoder,
};

/// Why an inbound event was not relayed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Authored by a bot, webhook, or our own proxy identity. Relaying
    /// these would re-ingest our own mirrors indefinitely.
    AutomatedAuthor,
    /// The source channel belongs to no configured portal.
    UnmappedChannel,
}

/// Why an edit/delete was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The referenced native id is outside the correlation window or was
    /// never relayed.
    UnknownMessage,
    /// The log entry exists but its id on the destination side is null:
    /// the original send there never completed.
    MissingCounterpart,
}

/// Terminal state of one inbound event's handling.
#[derive(Debug)]
pub enum RelayOutcome {
    Relayed(RelayedMessage),
    Dropped(DropReason),
    Ignored(IgnoreReason),
}

/// The relay orchestrator: composes the portal map, correlation log, and
/// identity-proxy registry with the two platform adapters.
///
/// All state is injected at construction so tests run against fresh
/// instances and mock adapters. The correlation log lock is never held
/// across an await; adapter calls from different events interleave freely.
pub struct Bridge {
    portals: PortalMap,
    log: Mutex<CorrelationLog>,
    proxies: Arc<ProxyRegistry>,
    transcoder: Arc<dyn ContentTranscoder>,
    discord: Arc<dyn PortalAdapter>,
    telegram: Arc<dyn PortalAdapter>,
}

impl Bridge {
    #[must_use]
    pub fn new(
        portals: PortalMap,
        log_capacity: usize,
        proxies: Arc<ProxyRegistry>,
        transcoder: Arc<dyn ContentTranscoder>,
        discord: Arc<dyn PortalAdapter>,
        telegram: Arc<dyn PortalAdapter>,
    ) -> Self {
        Self {
            portals,
            log: Mutex::new(CorrelationLog::new(log_capacity)),
            proxies,
            transcoder,
            discord,
            telegram,
        }
    }

    fn adapter(&self, platform: Platform) -> &dyn PortalAdapter {
        match platform {
            Platform::Discord => self.discord.as_ref(),
            Platform::Telegram => self.telegram.as_ref(),
        }
    }

    /// Relay a newly created message to the opposite platform.
    pub async fn handle_create(&self, inbound: InboundMessage) -> RelayOutcome {
        if inbound.from_automated {
            debug!(
                source = %inbound.source,
                native_id = %inbound.native_id,
                "dropping automated-author event"
            );
            return RelayOutcome::Dropped(DropReason::AutomatedAuthor);
        }

        let source = inbound.source;
        let Some(portal) = self.portals.resolve_destination(source, &inbound.channel) else {
            debug!(
                source = %source,
                channel = %inbound.channel,
                "dropping event from unmapped channel"
            );
            return RelayOutcome::Dropped(DropReason::UnmappedChannel);
        };
        let portal = portal.to_owned();
        let dest = source.opposite();

        let mut message = RelayedMessage {
            source,
            portal: portal.clone(),
            discord_id: None,
            telegram_id: None,
            content: self.transcoder.transcode(&inbound.content, source, dest),
            discord_reply_to: None,
            telegram_reply_to: None,
            author: inbound.author,
            attachments: inbound.attachments,
        };
        message.set_native_id(source, inbound.native_id);

        // Reply linkage is resolved exactly once, against whatever the
        // window holds right now. A referenced message arriving later
        // never retroactively links.
        if let Some(reply_to) = &inbound.reply_to {
            message.set_reply_to(source, reply_to.clone());
            let counterpart = {
                let log = self.log.lock().unwrap_or_else(|e| e.into_inner());
                log.find_by_native_id(source, reply_to)
                    .and_then(|target| target.native_id(dest).map(str::to_owned))
            };
            match counterpart {
                Some(id) => message.set_reply_to(dest, id),
                None => debug!(
                    source = %source,
                    reply_to = %reply_to,
                    "reply target outside correlation window, linkage omitted"
                ),
            }
        }

        let adapter = self.adapter(dest);
        let proxy = self.resolve_proxy(adapter, &portal, &message).await;

        match adapter.post_message(&message, proxy.as_deref()).await {
            Ok(native_id) => message.set_native_id(dest, native_id),
            Err(error) => {
                // The entry is still appended: the source-side id stays
                // usable as a reply target, and the missing side remains
                // permanently null (no retries).
                warn!(
                    error = %error,
                    source = %source,
                    portal = %portal,
                    "relay send failed, logging partial message"
                );
            },
        }

        {
            let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
            log.append(message.clone());
        }
        RelayOutcome::Relayed(message)
    }

    /// Propagate a content edit to the opposite platform's copy.
    pub async fn handle_edit(
        &self,
        source: Platform,
        native_id: &str,
        new_content: &str,
    ) -> RelayOutcome {
        let dest = source.opposite();
        let content = self.transcoder.transcode(new_content, source, dest);

        let entry = {
            let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
            if log.update_content(source, native_id, &content) {
                log.find_by_native_id(source, native_id).cloned()
            } else {
                None
            }
        };
        let Some(entry) = entry else {
            debug!(source = %source, native_id, "edit for unknown message, ignoring");
            return RelayOutcome::Ignored(IgnoreReason::UnknownMessage);
        };
        if entry.native_id(dest).is_none() {
            debug!(
                source = %source,
                native_id,
                "edit target was never relayed to the opposite side, ignoring"
            );
            return RelayOutcome::Ignored(IgnoreReason::MissingCounterpart);
        }

        let adapter = self.adapter(dest);
        let proxy = self.resolve_proxy(adapter, &entry.portal, &entry).await;
        if let Err(error) = adapter.edit_message(&entry, proxy.as_deref()).await {
            warn!(error = %error, source = %source, native_id, "edit propagation failed");
        }
        RelayOutcome::Relayed(entry)
    }

    /// Propagate a deletion to the opposite platform's copy. The log entry
    /// is retained so the deleted message stays resolvable as a reply
    /// target.
    pub async fn handle_delete(&self, source: Platform, native_id: &str) -> RelayOutcome {
        let dest = source.opposite();

        let entry = {
            let log = self.log.lock().unwrap_or_else(|e| e.into_inner());
            log.find_by_native_id(source, native_id).cloned()
        };
        let Some(entry) = entry else {
            debug!(source = %source, native_id, "delete for unknown message, ignoring");
            return RelayOutcome::Ignored(IgnoreReason::UnknownMessage);
        };
        if entry.native_id(dest).is_none() {
            debug!(
                source = %source,
                native_id,
                "delete target was never relayed to the opposite side, ignoring"
            );
            return RelayOutcome::Ignored(IgnoreReason::MissingCounterpart);
        }

        if let Err(error) = self.adapter(dest).delete_message(&entry).await {
            warn!(error = %error, source = %source, native_id, "delete propagation failed");
        }
        RelayOutcome::Relayed(entry)
    }

    /// Get-or-create the identity proxy for the message author, when the
    /// destination uses proxies. Creation failure degrades to a proxyless
    /// send instead of dropping the relay.
    async fn resolve_proxy(
        &self,
        adapter: &dyn PortalAdapter,
        portal: &str,
        message: &RelayedMessage,
    ) -> Option<String> {
        if !adapter.uses_identity_proxies() {
            return None;
        }
        match self
            .proxies
            .resolve(portal, &message.author.id, || {
                adapter.create_identity_proxy(portal, &message.author)
            })
            .await
        {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(
                    error = %error,
                    portal = %portal,
                    author = %message.author.id,
                    "identity proxy resolution failed, sending without proxy"
                );
                None
            },
        }
    }
}
