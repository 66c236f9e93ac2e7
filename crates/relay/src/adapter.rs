use {anyhow::Result, async_trait::async_trait, tgcord_common::{Author, Platform}};

use crate::message::RelayedMessage;

/// Outbound interface to one platform. Each messaging platform implements
/// this; the orchestrator never talks to a platform SDK directly.
///
/// Every call may fail with a transport error; the orchestrator catches,
/// logs, and swallows those; a failed relay never reaches the event
/// source.
#[async_trait]
pub trait PortalAdapter: Send + Sync {
    /// The platform this adapter sends to.
    fn platform(&self) -> Platform;

    /// Whether relayed messages on this platform are sent through
    /// per-author identity proxies. When true, the orchestrator resolves a
    /// proxy handle (creating one via [`Self::create_identity_proxy`])
    /// before posting.
    fn uses_identity_proxies(&self) -> bool {
        false
    }

    /// Send `message` into `message.portal`, impersonating the original
    /// author via `proxy` when given. Returns the native id the platform
    /// assigned.
    async fn post_message(&self, message: &RelayedMessage, proxy: Option<&str>) -> Result<String>;

    /// Propagate a content edit to the copy of `message` on this platform.
    async fn edit_message(&self, message: &RelayedMessage, proxy: Option<&str>) -> Result<()>;

    /// Delete the copy of `message` on this platform.
    async fn delete_message(&self, message: &RelayedMessage) -> Result<()>;

    /// Mint a new send-as identity for `author` in `portal`. Only invoked
    /// for adapters that report [`Self::uses_identity_proxies`].
    async fn create_identity_proxy(&self, portal: &str, author: &Author) -> Result<String>;
}
