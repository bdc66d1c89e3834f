//! Expiring key-value map
//!
//! One TTL map backs every short-lived record in the system: key slugs,
//! verification timers, creation rate-limit windows and the channel
//! lookup cache.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Thread-safe map whose entries expire after a fixed TTL.
///
/// Expiry is lazy: reads skip expired entries, and `purge_expired` drops
/// them in bulk for long-lived maps.
pub struct ExpiringMap<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> ExpiringMap<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Get a live value. Expired entries are removed on the way.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Age of a live entry, if present
    pub fn age(&self, key: &K) -> Option<Duration> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .map(|e| e.inserted_at.elapsed())
            .filter(|age| *age < self.ttl)
    }

    /// Remove and return a live value (single-use tokens)
    pub fn take(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        entries
            .remove(key)
            .filter(|e| e.inserted_at.elapsed() < self.ttl)
            .map(|e| e.value)
    }

    pub fn remove(&self, key: &K) -> bool {
        self.entries.lock().unwrap().remove(key).is_some()
    }

    /// Replace a live entry in place, keeping its insertion time
    pub fn update<F: FnOnce(&mut V)>(&self, key: &K, f: F) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                f(&mut entry.value);
                true
            }
            _ => false,
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, e| e.inserted_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_take() {
        let map = ExpiringMap::new(Duration::from_secs(60));
        map.insert("slug", "hwid-1".to_string());

        assert_eq!(map.get(&"slug"), Some("hwid-1".to_string()));
        assert_eq!(map.take(&"slug"), Some("hwid-1".to_string()));
        assert_eq!(map.get(&"slug"), None);
    }

    #[test]
    fn expired_entries_are_gone() {
        let map = ExpiringMap::new(Duration::from_millis(0));
        map.insert("k", 1);
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(map.get(&"k"), None);
        assert_eq!(map.take(&"k"), None);
        map.insert("k", 2);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(map.purge_expired(), 1);
        assert!(map.is_empty());
    }

    #[test]
    fn update_mutates_in_place() {
        let map = ExpiringMap::new(Duration::from_secs(60));
        map.insert("counter", 1);
        assert!(map.update(&"counter", |v| *v += 1));
        assert_eq!(map.get(&"counter"), Some(2));
        assert!(!map.update(&"missing", |v| *v += 1));
    }
}
