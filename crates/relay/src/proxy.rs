use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex},
};

use tokio::sync::OnceCell;

/// Registry of identity-proxy handles, keyed by (portal, author id).
///
/// A proxy handle is the opaque id of a destination-platform send-as
/// identity (a Discord webhook impersonating the original author). Handles
/// are created lazily, never expire, and live for the process lifetime.
///
/// Get-or-create must hold even when two events for the same never-seen
/// author interleave at the creation call's suspension point: each key maps
/// to a shared `OnceCell`, so concurrent resolvers coalesce onto a single
/// in-flight creation instead of minting duplicate identities. A failed
/// creation leaves the cell empty and the next resolve retries.
#[derive(Default)]
pub struct ProxyRegistry {
    entries: Mutex<HashMap<ProxyKey, Arc<OnceCell<String>>>>,
}

type ProxyKey = (String, String);

impl ProxyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached handle for (`portal`, `author_id`), creating it
    /// via `create` if absent. `create` performs network I/O and is
    /// invoked at most once per successful creation.
    pub async fn resolve<F, Fut>(
        &self,
        portal: &str,
        author_id: &str,
        create: F,
    ) -> anyhow::Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<String>>,
    {
        // Lock scope ends before any await: only the cell lookup is
        // guarded, never the creation call itself.
        let cell = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(
                entries
                    .entry((portal.to_owned(), author_id.to_owned()))
                    .or_default(),
            )
        };

        let handle = cell.get_or_try_init(create).await?;
        Ok(handle.clone())
    }

    /// The cached handle, if one exists and its creation completed.
    #[must_use]
    pub fn get(&self, portal: &str, author_id: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&(portal.to_owned(), author_id.to_owned()))
            .and_then(|cell| cell.get().cloned())
    }

    /// Drop a cached handle. Used when the destination platform reports it
    /// stale (e.g. the webhook was deleted externally); the next resolve
    /// recreates it.
    pub fn invalidate(&self, portal: &str, author_id: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(&(portal.to_owned(), author_id.to_owned()));
    }

    /// Overwrite the cached handle with one created out-of-band, e.g. by an
    /// adapter recovering from a stale handle mid-send.
    pub fn update(&self, portal: &str, author_id: &str, handle: String) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            (portal.to_owned(), author_id.to_owned()),
            Arc::new(OnceCell::new_with(Some(handle))),
        );
    }
}

impl std::fmt::Debug for ProxyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("ProxyRegistry")
            .field("entries", &entries.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use {
        super::*,
        std::sync::atomic::{AtomicUsize, Ordering},
        std::time::Duration,
    };

    #[tokio::test]
    async fn sequential_resolves_create_once() {
        let registry = ProxyRegistry::new();
        let calls = AtomicUsize::new(0);

        let first = registry
            .resolve("chan-en", "alice", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("wh-1".to_string())
            })
            .await
            .unwrap();
        let second = registry
            .resolve("chan-en", "alice", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("wh-2".to_string())
            })
            .await
            .unwrap();

        assert_eq!(first, "wh-1");
        assert_eq!(second, "wh-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_resolves_coalesce() {
        let registry = Arc::new(ProxyRegistry::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let create = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            // Suspend mid-creation so the second resolve observes the
            // in-flight cell rather than an absent entry.
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok("wh-1".to_string())
        };

        let (a, b) = tokio::join!(
            registry.resolve("chan-en", "alice", || create(Arc::clone(&calls))),
            registry.resolve("chan-en", "alice", || create(Arc::clone(&calls))),
        );

        assert_eq!(a.unwrap(), "wh-1");
        assert_eq!(b.unwrap(), "wh-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_create_separately() {
        let registry = ProxyRegistry::new();

        let a = registry
            .resolve("chan-en", "alice", || async { Ok("wh-a".to_string()) })
            .await
            .unwrap();
        let b = registry
            .resolve("chan-en", "bob", || async { Ok("wh-b".to_string()) })
            .await
            .unwrap();
        let c = registry
            .resolve("chan-ru", "alice", || async { Ok("wh-c".to_string()) })
            .await
            .unwrap();

        assert_eq!(a, "wh-a");
        assert_eq!(b, "wh-b");
        assert_eq!(c, "wh-c");
    }

    #[tokio::test]
    async fn failed_creation_retries() {
        let registry = ProxyRegistry::new();

        let err = registry
            .resolve("chan-en", "alice", || async {
                anyhow::bail!("webhook creation failed")
            })
            .await;
        assert!(err.is_err());
        assert_eq!(registry.get("chan-en", "alice"), None);

        let ok = registry
            .resolve("chan-en", "alice", || async { Ok("wh-1".to_string()) })
            .await
            .unwrap();
        assert_eq!(ok, "wh-1");
    }

    #[tokio::test]
    async fn invalidate_forces_recreation() {
        let registry = ProxyRegistry::new();

        registry
            .resolve("chan-en", "alice", || async { Ok("wh-1".to_string()) })
            .await
            .unwrap();
        registry.invalidate("chan-en", "alice");

        let recreated = registry
            .resolve("chan-en", "alice", || async { Ok("wh-2".to_string()) })
            .await
            .unwrap();
        assert_eq!(recreated, "wh-2");
    }

    #[tokio::test]
    async fn update_overwrites_cached_handle() {
        let registry = ProxyRegistry::new();

        registry
            .resolve("chan-en", "alice", || async { Ok("wh-stale".to_string()) })
            .await
            .unwrap();
        registry.update("chan-en", "alice", "wh-fresh".to_string());

        assert_eq!(registry.get("chan-en", "alice"), Some("wh-fresh".to_string()));
        let resolved = registry
            .resolve("chan-en", "alice", || async {
                anyhow::bail!("must not be called")
            })
            .await
            .unwrap();
        assert_eq!(resolved, "wh-fresh");
    }
}
