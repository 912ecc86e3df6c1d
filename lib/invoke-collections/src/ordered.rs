use std::{fmt, hash::Hash, sync::Arc};

use indexmap::{IndexMap, IndexSet};
use serde::{ser::SerializeMap as _, ser::SerializeSeq as _, Serialize, Serializer};

type FastBuildHasher = foldhash::quality::RandomState;

/// An immutable map that iterates in insertion order.
///
/// Cloning is cheap: clones share the same underlying storage.
pub struct ImmutableOrderedMap<K, V> {
    inner: Arc<IndexMap<K, V, FastBuildHasher>>,
}

impl<K, V> ImmutableOrderedMap<K, V> {
    /// Creates an empty map.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(IndexMap::with_hasher(FastBuildHasher::default())),
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over the entries, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter()
    }

    /// Returns an iterator over the keys, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.keys()
    }

    /// Returns an iterator over the values, in insertion order of their keys.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.values()
    }
}

impl<K: Hash + Eq, V> ImmutableOrderedMap<K, V> {
    /// Returns the value for the given key, if present.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    /// Returns `true` if the map holds the given key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }
}

impl<K, V> Clone for ImmutableOrderedMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for ImmutableOrderedMap<K, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ImmutableOrderedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.inner.iter()).finish()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for ImmutableOrderedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        // Order matters: two maps holding the same entries in a different order are different maps.
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<K: Serialize, V: Serialize> Serialize for ImmutableOrderedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.inner.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// An immutable set that iterates in insertion order.
pub struct ImmutableOrderedSet<T> {
    inner: Arc<IndexSet<T, FastBuildHasher>>,
}

impl<T> ImmutableOrderedSet<T> {
    /// Creates an empty set.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(IndexSet::with_hasher(FastBuildHasher::default())),
        }
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over the elements, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.inner.iter()
    }
}

impl<T: Hash + Eq> ImmutableOrderedSet<T> {
    /// Returns `true` if the set holds the given element.
    pub fn contains(&self, value: &T) -> bool {
        self.inner.contains(value)
    }
}

impl<T> Clone for ImmutableOrderedSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ImmutableOrderedSet<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for ImmutableOrderedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.inner.iter()).finish()
    }
}

impl<T: Serialize> Serialize for ImmutableOrderedSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for value in self.inner.iter() {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

/// Creates an immutable map from the given entries, preserving the order in which keys first appear.
///
/// When a key appears more than once, it keeps the position of its first appearance and the value of its last.
pub fn immutable_ordered_map_of<K, V, I>(entries: I) -> ImmutableOrderedMap<K, V>
where
    K: Hash + Eq,
    I: IntoIterator<Item = (K, V)>,
{
    let mut map = IndexMap::with_hasher(FastBuildHasher::default());
    map.extend(entries);
    if map.is_empty() {
        return ImmutableOrderedMap::empty();
    }

    ImmutableOrderedMap { inner: Arc::new(map) }
}

/// Creates an immutable set from the given elements, preserving the order in which they first appear.
///
/// Later duplicates are discarded.
pub fn immutable_ordered_set_of<T, I>(elements: I) -> ImmutableOrderedSet<T>
where
    T: Hash + Eq,
    I: IntoIterator<Item = T>,
{
    let mut set = IndexSet::with_hasher(FastBuildHasher::default());
    set.extend(elements);
    if set.is_empty() {
        return ImmutableOrderedSet::empty();
    }

    ImmutableOrderedSet { inner: Arc::new(set) }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn map_preserves_insertion_order() {
        let map = immutable_ordered_map_of([("zeta", 1), ("alpha", 2), ("mu", 3)]);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["zeta", "alpha", "mu"]);
        assert_eq!(map.get(&"alpha"), Some(&2));
        assert!(!map.contains_key(&"omega"));
    }

    #[test]
    fn map_repeated_key_keeps_position_and_last_value() {
        let map = immutable_ordered_map_of([("a", 1), ("b", 2), ("a", 3)]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(&"a", &3), (&"b", &2)]);
    }

    #[test]
    fn missing_input_is_empty() {
        let entries: Option<Vec<(u8, u8)>> = None;
        let map = immutable_ordered_map_of(entries.into_iter().flatten());
        assert!(map.is_empty());
        assert_eq!(map, ImmutableOrderedMap::empty());

        let set = immutable_ordered_set_of(Vec::<u8>::new());
        assert!(set.is_empty());
    }

    #[test]
    fn set_keeps_first_occurrence() {
        let set = immutable_ordered_set_of(vec![3, 1, 3, 2, 1]);
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
        assert!(set.contains(&2));
        assert!(!set.contains(&4));
    }

    #[test]
    fn clones_share_storage() {
        let map = immutable_ordered_map_of([(1, "one")]);
        let cloned = map.clone();
        assert!(Arc::ptr_eq(&map.inner, &cloned.inner));
    }

    #[test]
    fn serializes_in_order() {
        let map = immutable_ordered_map_of([("b", 1), ("a", 2)]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"b":1,"a":2}"#);

        let set = immutable_ordered_set_of(["y", "x"]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["y","x"]"#);
    }

    proptest! {
        #[test]
        fn property_test_set_order_matches_first_occurrence(input in any::<Vec<u8>>()) {
            let set = immutable_ordered_set_of(input.iter().copied());

            let mut expected = Vec::new();
            for value in &input {
                if !expected.contains(value) {
                    expected.push(*value);
                }
            }

            prop_assert_eq!(set.iter().copied().collect::<Vec<_>>(), expected);
        }
    }
}
