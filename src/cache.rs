use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Expiring memo store keyed by request parameters.
///
/// Entries live for a fixed TTL measured from insertion.  Lookups never block
/// on anything async; the mutex is held only for map access, so callers may
/// use this from handlers freely.  Expired entries are swept lazily on insert.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (V, Instant)>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry.  Expired entries are removed and report a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut map = self.entries.lock().unwrap();
        match map.get(key) {
            Some((_, deadline)) if *deadline <= Instant::now() => {
                map.remove(key);
                None
            }
            Some((value, _)) => Some(value.clone()),
            None => None,
        }
    }

    /// Store a value, stamping it with `now + ttl`.
    pub fn insert(&self, key: K, value: V) {
        let mut map = self.entries.lock().unwrap();
        let now = Instant::now();
        map.retain(|_, (_, deadline)| *deadline > now);
        map.insert(key, (value, now + self.ttl));
    }

    /// Drop one entry regardless of age.  Used by the explicit reload path.
    pub fn invalidate(&self, key: &K) {
        self.entries.lock().unwrap().remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn hit_within_ttl() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a".to_string(), 7);
        assert_eq!(cache.get(&"a".to_string()), Some(7));
        assert_eq!(cache.get(&"b".to_string()), None);
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(10));
        cache.insert("a".to_string(), 7);
        sleep(Duration::from_millis(25));
        assert_eq!(cache.get(&"a".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_forces_miss() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a".to_string(), 7);
        cache.invalidate(&"a".to_string());
        assert_eq!(cache.get(&"a".to_string()), None);
    }

    #[test]
    fn insert_sweeps_stale_entries() {
        let cache: TtlCache<u32, u32> = TtlCache::new(Duration::from_millis(10));
        cache.insert(1, 1);
        cache.insert(2, 2);
        sleep(Duration::from_millis(25));
        cache.insert(3, 3);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&3), Some(3));
    }

    #[test]
    fn reinsert_refreshes_deadline() {
        let cache: TtlCache<u32, u32> = TtlCache::new(Duration::from_millis(40));
        cache.insert(1, 1);
        sleep(Duration::from_millis(25));
        cache.insert(1, 2);
        sleep(Duration::from_millis(25));
        // 50ms after the first insert but only 25ms after the second.
        assert_eq!(cache.get(&1), Some(2));
    }
}
