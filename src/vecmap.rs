use core::cmp::Ord;

/// A map kept as a sorted vector, addressable both by key and by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VecMap<K, V> {
    items: Vec<(K, V)>,
}

impl<K, V> VecMap<K, V> {
    pub const fn new() -> Self {
        Self { items: vec![] }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.items.get(index).map(|(k, v)| (k, v))
    }
}

impl<K: Ord, V> VecMap<K, V> {
    pub fn insert(&mut self, k: K, v: V) {
        match self.items.binary_search_by_key(&&k, |(k2, _)| k2) {
            Ok(index) => self.items[index] = (k, v),
            Err(index) => self.items.insert(index, (k, v)),
        }
    }

    /// Index of `k` in key order.
    pub fn position(&self, k: &K) -> Option<usize> {
        self.items.binary_search_by_key(&k, |(k2, _)| k2).ok()
    }

    /// Entries with a key not less than `k`, in key order.
    pub fn range_from(&self, k: &K) -> impl Iterator<Item = (&K, &V)> {
        let start = self.items.partition_point(|(k2, _)| k2 < k);
        self.items[start..].iter().map(|(k, v)| (k, v))
    }
}

impl<K, V> Default for VecMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_positions() {
        let mut map = VecMap::new();
        map.insert(30, 'c');
        map.insert(10, 'a');
        map.insert(20, 'b');
        map.insert(20, 'B');
        assert_eq!(map.len(), 3);
        assert_eq!(map.get_index(1), Some((&20, &'B')));
        assert_eq!(map.position(&30), Some(2));
        assert_eq!(map.position(&25), None);
        assert_eq!(map.get_index(0), Some((&10, &'a')));
    }

    #[test]
    fn range_from_between_keys() {
        let mut map = VecMap::new();
        for k in [1, 3, 5, 7] {
            map.insert(k, ());
        }
        let keys: Vec<_> = map.range_from(&4).map(|(k, _)| *k).collect();
        assert_eq!(keys, [5, 7]);
        assert_eq!(map.range_from(&8).count(), 0);
    }
}
