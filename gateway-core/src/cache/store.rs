//! C5 storage: TTL expiry, an LRU cap, a slug-keyed invalidation index, and single-flight
//! dedup for concurrent misses on the same key.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::key::CacheKey;

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: HashMap<String, String>,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl CachedResponse {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

struct Inner {
    entries: LruCache<CacheKey, CachedResponse>,
    by_slug: HashMap<String, HashSet<CacheKey>>,
}

pub struct ResponseCache {
    inner: Mutex<Inner>,
    inflight: Mutex<HashMap<CacheKey, broadcast::Sender<()>>>,
    pub default_ttl: Duration,
}

impl ResponseCache {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        let capacity = std::num::NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                by_slug: HashMap::new(),
            }),
            inflight: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<CachedResponse> {
        let mut inner = self.inner.lock();
        match inner.entries.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.clone()),
            Some(_) => {
                inner.entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: CacheKey, slug: &str, response: CachedResponse) {
        let mut inner = self.inner.lock();
        inner.by_slug.entry(slug.to_string()).or_default().insert(key.clone());
        inner.entries.put(key, response);
    }

    /// Discards every entry belonging to `slug`, used when a catalog mutation changes or removes
    /// that route.
    pub fn invalidate_slug(&self, slug: &str) {
        let mut inner = self.inner.lock();
        if let Some(keys) = inner.by_slug.remove(slug) {
            for key in keys {
                inner.entries.pop(&key);
            }
        }
    }

    /// Removes entries whose TTL has elapsed. Intended to run on a background interval.
    pub fn sweep_expired(&self) {
        let mut inner = self.inner.lock();
        let expired: Vec<CacheKey> = inner
            .entries
            .iter()
            .filter(|(_, v)| v.is_expired())
            .map(|(k, _)| k.clone())
            .collect();
        for key in expired {
            inner.entries.pop(&key);
        }
        inner.by_slug.retain(|_, keys| {
            keys.retain(|k| inner.entries.peek(k).is_some());
            !keys.is_empty()
        });
    }

    /// Registers this call as the single-flight leader for `key` if none exists yet. Returns
    /// `None` when this caller is the leader (must perform the dispatch and call
    /// `finish_inflight`); returns `Some(receiver)` when another caller is already in flight.
    ///
    /// The receiver is subscribed to the completion broadcast while still holding the inflight
    /// lock, under the same mutex `finish_inflight` takes to send on it — so the subscription
    /// always happens-before the leader's completion signal, and a follower that calls `recv()`
    /// after the leader has already finished still observes the buffered value instead of
    /// blocking forever (the lost-wakeup a bare `Notify::notify_waiters` can't rule out, since it
    /// only wakes listeners already polling at the moment it fires).
    pub fn begin_inflight(&self, key: &CacheKey) -> Option<broadcast::Receiver<()>> {
        let mut inflight = self.inflight.lock();
        if let Some(sender) = inflight.get(key) {
            return Some(sender.subscribe());
        }
        let (tx, _rx) = broadcast::channel(1);
        inflight.insert(key.clone(), tx);
        None
    }

    pub fn finish_inflight(&self, key: &CacheKey) {
        let mut inflight = self.inflight.lock();
        if let Some(sender) = inflight.remove(key) {
            let _ = sender.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> CacheKey {
        CacheKey(s.to_string())
    }

    fn response() -> CachedResponse {
        CachedResponse {
            status: 200,
            body: b"ok".to_vec(),
            headers: HashMap::new(),
            stored_at: Instant::now(),
            ttl: Duration::from_secs(60),
        }
    }

    #[test]
    fn put_then_get_hits() {
        let cache = ResponseCache::new(10, Duration::from_secs(60));
        cache.put(key("k1"), "slug-a", response());
        assert!(cache.get(&key("k1")).is_some());
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = ResponseCache::new(10, Duration::from_secs(60));
        let mut r = response();
        r.ttl = Duration::from_millis(1);
        cache.put(key("k1"), "slug-a", r);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&key("k1")).is_none());
    }

    #[test]
    fn invalidate_slug_drops_its_keys_only() {
        let cache = ResponseCache::new(10, Duration::from_secs(60));
        cache.put(key("k1"), "slug-a", response());
        cache.put(key("k2"), "slug-b", response());
        cache.invalidate_slug("slug-a");
        assert!(cache.get(&key("k1")).is_none());
        assert!(cache.get(&key("k2")).is_some());
    }

    #[tokio::test]
    async fn follower_does_not_miss_a_leader_that_already_finished() {
        let cache = ResponseCache::new(10, Duration::from_secs(60));
        let k = key("k1");
        assert!(cache.begin_inflight(&k).is_none());
        // Leader finishes before the follower ever subscribes to the completion signal.
        cache.finish_inflight(&k);
        let follower = cache.begin_inflight(&k);
        assert!(follower.is_none(), "inflight entry was removed, so this caller becomes the new leader");

        // Re-register a leader, then race a follower's subscribe against its own finish: the
        // subscribe always happens under the same lock `finish_inflight` takes, so `recv` must
        // still observe the completion even though it's called after `finish_inflight` below.
        assert!(cache.begin_inflight(&k).is_none());
        let mut rx = cache.begin_inflight(&k).expect("second caller is a follower");
        cache.finish_inflight(&k);
        assert!(rx.recv().await.is_ok(), "follower must observe the buffered completion, not hang");
    }
}
