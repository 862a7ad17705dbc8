use core::{hash::Hash, num::NonZeroUsize};
use lru::LruCache;

/// Memo of rendered output, shared by every view that renders the same keys.
pub trait Cache<K, V> {
    fn get(&mut self, key: &K) -> Option<&V>;
    fn put(&mut self, key: K, value: V);
    fn invalidate(&mut self, key: &K);
    fn clear(&mut self);
}

/// Bounded cache that evicts the least recently used entry.
#[derive(Debug)]
pub struct Lru<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
}

impl<K: Hash + Eq, V> Lru<K, V> {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Looks up `key` without marking it used.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }
}

impl<K: Hash + Eq, V> Cache<K, V> for Lru<K, V> {
    fn get(&mut self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    fn put(&mut self, key: K, value: V) {
        self.entries.put(key, value);
    }

    fn invalidate(&mut self, key: &K) {
        self.entries.pop(key);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = Lru::new(2);
        cache.put(1, "a");
        cache.put(2, "b");
        assert_eq!(cache.get(&1), Some(&"a"));
        cache.put(3, "c");
        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn overwrite_does_not_evict() {
        let mut cache = Lru::new(2);
        cache.put(1, "a");
        cache.put(2, "b");
        cache.put(2, "B");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&2), Some(&"B"));
    }

    #[test]
    fn invalidate_and_clear() {
        let mut cache = Lru::new(4);
        cache.put('x', 1);
        cache.put('y', 2);
        cache.invalidate(&'x');
        assert_eq!(cache.get(&'x'), None);
        assert_eq!(cache.get(&'y'), Some(&2));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_keeps_one_entry() {
        let mut cache = Lru::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.put(1, 'a');
        cache.put(2, 'b');
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&2), Some(&'b'));
    }
}
