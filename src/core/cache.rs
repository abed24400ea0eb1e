use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub type SharedError = Arc<anyhow::Error>;
type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, SharedError>>>;

enum Entry<V> {
    Ready { value: V, fetched_at: Instant },
    InFlight { id: u64, fetch: SharedFetch<V> },
}

/// Keyed query results shared between consumers.
///
/// Concurrent lookups of the same key join one in-flight fetch. Successful
/// results are kept until they are older than `stale_after` (forever when
/// unset); failures are handed to every waiter and not cached.
pub struct QueryCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    stale_after: Option<Duration>,
    next_id: AtomicU64,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_stale_after(None)
    }

    pub fn with_stale_after(stale_after: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            stale_after,
            next_id: AtomicU64::new(0),
        }
    }

    fn is_fresh(&self, fetched_at: Instant) -> bool {
        self.stale_after
            .is_none_or(|window| fetched_at.elapsed() < window)
    }

    /// Returns the cached value for `key`, or runs `fetch` to produce it.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<V, SharedError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let (id, shared) = {
            let mut entries = self.entries.lock().await;
            match entries.get(&key) {
                Some(Entry::Ready { value, fetched_at }) if self.is_fresh(*fetched_at) => {
                    debug!("Query cache HIT for key: {:?}", key);
                    return Ok(value.clone());
                }
                Some(Entry::InFlight { id, fetch }) => {
                    debug!("Query cache JOIN in-flight fetch for key: {:?}", key);
                    (*id, fetch.clone())
                }
                _ => {
                    debug!("Query cache MISS for key: {:?}", key);
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let shared = fetch().map(|r| r.map_err(Arc::new)).boxed().shared();
                    entries.insert(
                        key.clone(),
                        Entry::InFlight {
                            id,
                            fetch: shared.clone(),
                        },
                    );
                    (id, shared)
                }
            }
        };

        let result = shared.await;

        let mut entries = self.entries.lock().await;
        let still_ours = matches!(
            entries.get(&key),
            Some(Entry::InFlight { id: current, .. }) if *current == id
        );
        if still_ours {
            match &result {
                Ok(value) => {
                    entries.insert(
                        key,
                        Entry::Ready {
                            value: value.clone(),
                            fetched_at: Instant::now(),
                        },
                    );
                }
                Err(e) => {
                    debug!("Query cache dropping failed fetch for key: {key:?}: {e}");
                    entries.remove(&key);
                }
            }
        }
        result
    }

    /// Returns the cached value only if it is present and fresh.
    pub async fn peek(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            Some(Entry::Ready { value, fetched_at }) if self.is_fresh(*fetched_at) => {
                Some(value.clone())
            }
            _ => None,
        }
    }

    pub async fn invalidate(&self, key: &K) {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        debug!("Query cache INVALIDATE for key: {:?}", key);
    }
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
