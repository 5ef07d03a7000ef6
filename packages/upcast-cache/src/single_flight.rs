use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

struct Slot<V, E> {
    value: Option<(V, Instant)>,
    failure: Option<(E, Instant)>,
}

impl<V, E> Default for Slot<V, E> {
    fn default() -> Self {
        Self {
            value: None,
            failure: None,
        }
    }
}

/// A keyed cache where at most one refresh per key is in flight.
///
/// Each key owns a mutex that is held for the whole refresh, so callers that
/// arrive while a refresh is running wait for it and share its outcome. The
/// key map itself is only locked long enough to find or create the slot;
/// refreshes of different keys never wait on each other.
///
/// A value is written only after its fetch completes. A failed or cancelled
/// refresh leaves the previous value in place, and that value keeps being
/// served until a later refresh succeeds.
pub struct SingleFlightCache<V, E> {
    ttl: Duration,
    slots: RwLock<HashMap<String, Arc<Mutex<Slot<V, E>>>>>,
}

impl<V, E> SingleFlightCache<V, E>
where
    V: Clone,
    E: Clone + Display,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn slot(&self, key: &str) -> Arc<Mutex<Slot<V, E>>> {
        if let Some(slot) = self.slots.read().await.get(key) {
            return slot.clone();
        }
        self.slots
            .write()
            .await
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Return the cached value for `key`, running `fetch` if it is missing or
    /// older than the ttl.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let requested_at = Instant::now();
        let slot = self.slot(key).await;
        let mut slot = slot.lock().await;

        if let Some((value, fetched_at)) = &slot.value {
            // Fetched while we were queued counts as fresh regardless of ttl.
            if *fetched_at >= requested_at || fetched_at.elapsed() < self.ttl {
                tracing::trace!(key, "cache hit");
                return Ok(value.clone());
            }
        }
        if let Some((error, failed_at)) = &slot.failure {
            if *failed_at >= requested_at {
                return Self::fallback(key, &slot, error.clone());
            }
        }

        tracing::debug!(key, "cache refresh");
        match fetch().await {
            Ok(value) => {
                slot.value = Some((value.clone(), Instant::now()));
                slot.failure = None;
                Ok(value)
            }
            Err(error) => {
                slot.failure = Some((error.clone(), Instant::now()));
                Self::fallback(key, &slot, error)
            }
        }
    }

    fn fallback(key: &str, slot: &Slot<V, E>, error: E) -> Result<V, E> {
        match &slot.value {
            Some((value, _)) => {
                tracing::warn!(key, %error, "refresh failed, serving previous value");
                Ok(value.clone())
            }
            None => Err(error),
        }
    }

    /// The last successfully fetched value, however old.
    pub async fn peek(&self, key: &str) -> Option<V> {
        let slot = self.slots.read().await.get(key).cloned()?;
        let slot = slot.lock().await;
        slot.value.as_ref().map(|(value, _)| value.clone())
    }

    pub async fn invalidate(&self, key: &str) {
        self.slots.write().await.remove(key);
    }

    pub async fn clear(&self) {
        self.slots.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}
