//! Identity/context cache.
//!
//! Amortizes the network origin lookup across requests and keeps one audit
//! session id per browsing session.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::ports::{NetworkOriginLookup, SessionStore};
use crate::errors::LookupError;

#[derive(Debug, Clone)]
struct CachedOrigin {
    value: String,
    fetched_at: Instant,
}

pub struct ContextCache {
    lookup: Arc<dyn NetworkOriginLookup>,
    sessions: Arc<dyn SessionStore>,
    ttl: Duration,
    io_timeout: Duration,
    origin: Mutex<Option<CachedOrigin>>,
}

impl ContextCache {
    pub fn new(
        lookup: Arc<dyn NetworkOriginLookup>,
        sessions: Arc<dyn SessionStore>,
        ttl: Duration,
        io_timeout: Duration,
    ) -> Self {
        Self {
            lookup,
            sessions,
            ttl,
            io_timeout,
            origin: Mutex::new(None),
        }
    }

    /// Returns the cached origin while it is younger than the TTL, otherwise
    /// performs one lookup.
    ///
    /// Concurrent callers wait on the same lookup. A failed lookup returns
    /// `None` and leaves the cache untouched, so the next call retries.
    pub async fn get_network_origin(&self) -> Option<String> {
        let mut cached = self.origin.lock().await;

        if let Some(entry) = cached.as_ref() {
            if entry.fetched_at.elapsed() < self.ttl {
                return Some(entry.value.clone());
            }
        }

        let result = match tokio::time::timeout(self.io_timeout, self.lookup.lookup()).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout),
        };

        match result {
            Ok(value) => {
                *cached = Some(CachedOrigin {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                });
                Some(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Network origin lookup failed");
                None
            }
        }
    }

    /// Returns the audit session id stored for `session_key`, generating and
    /// storing one on first use. Without a session key a fresh id is returned
    /// each time.
    pub fn session_token(&self, session_key: Option<&str>) -> String {
        let Some(key) = session_key else {
            return shared::session::generate_session_token();
        };

        if let Some(existing) = self.sessions.get(key) {
            return existing;
        }

        let token = shared::session::generate_session_token();
        self.sessions.put(key, token.clone());
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::in_memory::{InMemorySessionStore, StaticOriginLookup};

    fn cache(lookup: Arc<StaticOriginLookup>) -> ContextCache {
        ContextCache::new(
            lookup,
            Arc::new(InMemorySessionStore::new()),
            Duration::from_secs(300),
            Duration::from_secs(5),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_origin_cached_within_ttl() {
        let lookup = Arc::new(StaticOriginLookup::new("203.0.113.7"));
        let cache = cache(lookup.clone());

        assert_eq!(cache.get_network_origin().await.as_deref(), Some("203.0.113.7"));
        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get_network_origin().await.as_deref(), Some("203.0.113.7"));

        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_origin_refreshed_after_ttl() {
        let lookup = Arc::new(StaticOriginLookup::new("203.0.113.7"));
        let cache = cache(lookup.clone());

        cache.get_network_origin().await;
        tokio::time::advance(Duration::from_secs(301)).await;
        cache.get_network_origin().await;

        assert_eq!(lookup.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_lookup_does_not_poison_cache() {
        let lookup = Arc::new(StaticOriginLookup::new("203.0.113.7"));
        lookup.set_failing(true);
        let cache = cache(lookup.clone());

        assert!(cache.get_network_origin().await.is_none());

        lookup.set_failing(false);
        assert_eq!(cache.get_network_origin().await.as_deref(), Some("203.0.113.7"));
        assert_eq!(lookup.calls(), 2);
    }

    #[test]
    fn test_session_token_reused_per_session() {
        let cache = cache(Arc::new(StaticOriginLookup::new("198.51.100.1")));

        let first = cache.session_token(Some("jti-1"));
        let again = cache.session_token(Some("jti-1"));
        let other = cache.session_token(Some("jti-2"));

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert!(first.starts_with(shared::session::SESSION_TOKEN_PREFIX));
    }
}
