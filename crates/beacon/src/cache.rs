//! A bounded, time-expiring cache for downloaded beacon states.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::VersionedBeaconState;

/// How long a downloaded state stays usable.
pub const STATE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// How many states are kept at once. Entries are tens of megabytes, so the
/// bound is deliberately small.
pub const STATE_CACHE_CAPACITY: usize = 3;

#[derive(Debug)]
struct CacheEntry {
    stored_at: Instant,
    state: Arc<VersionedBeaconState>,
}

/// An LRU cache of decoded beacon states keyed by state identifier, with
/// entries expiring after a fixed TTL.
#[derive(Debug)]
pub struct StateCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl StateCache {
    /// Creates a cache holding at most `capacity` states for at most `ttl`.
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self { entries: Mutex::new(LruCache::new(capacity)), ttl }
    }

    /// Returns the cached state for `id` if present and not expired.
    pub fn get(&self, id: &str) -> Option<Arc<VersionedBeaconState>> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(id) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.state.clone()),
            Some(_) => {
                entries.pop(id);
                None
            }
            None => None,
        }
    }

    /// Stores `state` under `id`, evicting the least recently used entry if
    /// the cache is full.
    pub fn put(&self, id: String, state: Arc<VersionedBeaconState>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(id, CacheEntry { stored_at: Instant::now(), state });
        }
    }
}

impl Default for StateCache {
    fn default() -> Self {
        Self::new(
            NonZeroUsize::new(STATE_CACHE_CAPACITY).expect("capacity is non-zero"),
            STATE_CACHE_TTL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_state;
    use crate::{MainnetEthSpec, VersionedBeaconState};

    fn state(slot: u64) -> Arc<VersionedBeaconState> {
        Arc::new(VersionedBeaconState::Mainnet(sample_state::<MainnetEthSpec>(slot)))
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let cache = StateCache::default();
        assert!(cache.get("100").is_none());
        cache.put("100".to_string(), state(100));
        assert_eq!(cache.get("100").unwrap().slot(), 100);
    }

    #[test]
    fn test_cache_expires_entries() {
        let cache = StateCache::new(NonZeroUsize::new(2).unwrap(), Duration::ZERO);
        cache.put("100".to_string(), state(100));
        assert!(cache.get("100").is_none());
    }

    #[test]
    fn test_cache_evicts_least_recently_used() {
        let cache = StateCache::new(NonZeroUsize::new(2).unwrap(), Duration::from_secs(60));
        cache.put("1".to_string(), state(1));
        cache.put("2".to_string(), state(2));
        cache.put("3".to_string(), state(3));
        assert!(cache.get("1").is_none());
        assert!(cache.get("2").is_some());
        assert!(cache.get("3").is_some());
    }
}
