use std::{cmp::Ordering, fmt, sync::Arc};

use serde::{ser::SerializeMap as _, ser::SerializeSeq as _, Serialize, Serializer};

type CustomComparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

enum Comparator<T> {
    Natural(fn(&T, &T) -> Ordering),
    Custom(CustomComparator<T>),
}

impl<T> Comparator<T> {
    fn natural() -> Self
    where
        T: Ord,
    {
        Self::Natural(T::cmp)
    }

    fn custom<F>(f: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    fn compare(&self, a: &T, b: &T) -> Ordering {
        match self {
            Self::Natural(f) => f(a, b),
            Self::Custom(f) => f(a, b),
        }
    }

    fn as_custom(&self) -> Option<&(dyn Fn(&T, &T) -> Ordering + Send + Sync)> {
        match self {
            Self::Natural(_) => None,
            Self::Custom(f) => Some(f.as_ref()),
        }
    }
}

impl<T> Clone for Comparator<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Natural(f) => Self::Natural(*f),
            Self::Custom(f) => Self::Custom(Arc::clone(f)),
        }
    }
}

/// An immutable map that iterates in key order.
///
/// Keys are ordered either naturally, by [`Ord`], or by a comparator given at construction. Lookups use the same
/// ordering, so two keys the comparator considers equal are the same key as far as the map is concerned.
pub struct ImmutableSortedMap<K, V> {
    entries: Arc<[(K, V)]>,
    comparator: Comparator<K>,
}

impl<K: Ord, V> ImmutableSortedMap<K, V> {
    /// Creates an empty map using natural key ordering.
    pub fn empty() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
            comparator: Comparator::natural(),
        }
    }
}

impl<K, V> ImmutableSortedMap<K, V> {
    /// Creates an empty map that orders keys with the given comparator.
    pub fn with_comparator<F>(comparator: F) -> Self
    where
        F: Fn(&K, &K) -> Ordering + Send + Sync + 'static,
    {
        Self {
            entries: Arc::from(Vec::new()),
            comparator: Comparator::custom(comparator),
        }
    }

    /// Returns the comparator used to order keys, or `None` if keys are ordered naturally.
    pub fn comparator(&self) -> Option<&(dyn Fn(&K, &K) -> Ordering + Send + Sync)> {
        self.comparator.as_custom()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the value for the given key, if present.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries
            .binary_search_by(|(k, _)| self.comparator.compare(k, key))
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    /// Returns `true` if the map holds the given key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns the entry with the lowest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.entries.first().map(|(k, v)| (k, v))
    }

    /// Returns the entry with the highest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.entries.last().map(|(k, v)| (k, v))
    }

    /// Returns an iterator over the entries, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Returns an iterator over the keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over the values, in the order of their keys.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K, V> Clone for ImmutableSortedMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            comparator: self.comparator.clone(),
        }
    }
}

impl<K: Ord, V> Default for ImmutableSortedMap<K, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ImmutableSortedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for ImmutableSortedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Serialize, V: Serialize> Serialize for ImmutableSortedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// An immutable set that iterates in element order.
pub struct ImmutableSortedSet<T> {
    elements: Arc<[T]>,
    comparator: Comparator<T>,
}

impl<T: Ord> ImmutableSortedSet<T> {
    /// Creates an empty set using natural ordering.
    pub fn empty() -> Self {
        Self {
            elements: Arc::from(Vec::new()),
            comparator: Comparator::natural(),
        }
    }
}

impl<T> ImmutableSortedSet<T> {
    /// Creates an empty set that orders elements with the given comparator.
    pub fn with_comparator<F>(comparator: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self {
            elements: Arc::from(Vec::new()),
            comparator: Comparator::custom(comparator),
        }
    }

    /// Returns the comparator used to order elements, or `None` if elements are ordered naturally.
    pub fn comparator(&self) -> Option<&(dyn Fn(&T, &T) -> Ordering + Send + Sync)> {
        self.comparator.as_custom()
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns `true` if the set holds the given element.
    pub fn contains(&self, value: &T) -> bool {
        self.elements
            .binary_search_by(|e| self.comparator.compare(e, value))
            .is_ok()
    }

    /// Returns the lowest element.
    pub fn first(&self) -> Option<&T> {
        self.elements.first()
    }

    /// Returns the highest element.
    pub fn last(&self) -> Option<&T> {
        self.elements.last()
    }

    /// Returns an iterator over the elements, in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }
}

impl<T> Clone for ImmutableSortedSet<T> {
    fn clone(&self) -> Self {
        Self {
            elements: Arc::clone(&self.elements),
            comparator: self.comparator.clone(),
        }
    }
}

impl<T: Ord> Default for ImmutableSortedSet<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for ImmutableSortedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for ImmutableSortedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl<T: Serialize> Serialize for ImmutableSortedSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for value in self.iter() {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

fn sorted_entries<K, V, I>(entries: I, comparator: &Comparator<K>) -> Vec<(K, V)>
where
    I: IntoIterator<Item = (K, V)>,
{
    let mut sorted = entries.into_iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| comparator.compare(&a.0, &b.0));

    // The sort is stable, so equal keys are still in the order they were given: keep the first key, take the last value.
    let mut merged: Vec<(K, V)> = Vec::with_capacity(sorted.len());
    for (key, value) in sorted {
        match merged.last_mut() {
            Some(last) if comparator.compare(&last.0, &key) == Ordering::Equal => last.1 = value,
            _ => merged.push((key, value)),
        }
    }
    merged
}

fn sorted_elements<T, I>(elements: I, comparator: &Comparator<T>) -> Vec<T>
where
    I: IntoIterator<Item = T>,
{
    let mut sorted = elements.into_iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| comparator.compare(a, b));
    sorted.dedup_by(|later, earlier| comparator.compare(later, earlier) == Ordering::Equal);
    sorted
}

/// Creates an immutable map from the given entries, ordered by key.
///
/// When a key appears more than once, the map holds the first instance of the key with the last value given for it.
pub fn immutable_sorted_map_of<K, V, I>(entries: I) -> ImmutableSortedMap<K, V>
where
    K: Ord,
    I: IntoIterator<Item = (K, V)>,
{
    let comparator = Comparator::natural();
    let entries = sorted_entries(entries, &comparator);
    if entries.is_empty() {
        return ImmutableSortedMap::empty();
    }

    ImmutableSortedMap {
        entries: Arc::from(entries),
        comparator,
    }
}

/// Creates an immutable map from the given entries, ordered by key using the given comparator.
///
/// Keys that the comparator considers equal are treated as the same key: the map holds the first of them, with the last
/// value given. The comparator is kept even when there are no entries.
pub fn immutable_sorted_map_by<K, V, I, F>(entries: I, comparator: F) -> ImmutableSortedMap<K, V>
where
    I: IntoIterator<Item = (K, V)>,
    F: Fn(&K, &K) -> Ordering + Send + Sync + 'static,
{
    let comparator = Comparator::custom(comparator);
    let entries = sorted_entries(entries, &comparator);

    ImmutableSortedMap {
        entries: Arc::from(entries),
        comparator,
    }
}

/// Creates an immutable set from the given elements, in order.
///
/// Duplicates after the first are discarded.
pub fn immutable_sorted_set_of<T, I>(elements: I) -> ImmutableSortedSet<T>
where
    T: Ord,
    I: IntoIterator<Item = T>,
{
    let comparator = Comparator::natural();
    let elements = sorted_elements(elements, &comparator);
    if elements.is_empty() {
        return ImmutableSortedSet::empty();
    }

    ImmutableSortedSet {
        elements: Arc::from(elements),
        comparator,
    }
}

/// Creates an immutable set from the given elements, ordered by the given comparator.
///
/// Elements that the comparator considers equal after the first are discarded. The comparator is kept even when there
/// are no elements.
pub fn immutable_sorted_set_by<T, I, F>(elements: I, comparator: F) -> ImmutableSortedSet<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    let comparator = Comparator::custom(comparator);
    let elements = sorted_elements(elements, &comparator);

    ImmutableSortedSet {
        elements: Arc::from(elements),
        comparator,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn map_is_sorted_by_key() {
        let map = immutable_sorted_map_of([(3, "c"), (1, "a"), (2, "b")]);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(map.get(&2), Some(&"b"));
        assert_eq!(map.get(&4), None);
        assert_eq!(map.first_key_value(), Some((&1, &"a")));
        assert_eq!(map.last_key_value(), Some((&3, &"c")));
        assert!(map.comparator().is_none());
    }

    #[test]
    fn map_repeated_key_takes_last_value() {
        let map = immutable_sorted_map_of([("k", 1), ("j", 0), ("k", 2)]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&"k"), Some(&2));
    }

    #[test]
    fn map_with_comparator_keeps_first_key() {
        let map = immutable_sorted_map_by([("Beta", 1), ("alpha", 2), ("BETA", 3)], |a: &&str, b: &&str| {
            a.to_lowercase().cmp(&b.to_lowercase())
        });

        assert!(map.comparator().is_some());
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(&"alpha", &2), (&"Beta", &3)]);
        assert_eq!(map.get(&"beta"), Some(&3));
    }

    #[test]
    fn empty_inputs() {
        let map = immutable_sorted_map_of(Vec::<(u8, u8)>::new());
        assert!(map.is_empty());
        assert_eq!(map, ImmutableSortedMap::empty());

        let reversed = immutable_sorted_map_by(None::<Vec<(u8, u8)>>.into_iter().flatten(), |a, b| b.cmp(a));
        assert!(reversed.is_empty());
        let cmp = reversed.comparator().expect("comparator should be kept");
        assert_eq!(cmp(&1, &2), Ordering::Greater);

        let set = ImmutableSortedSet::<u8>::with_comparator(|a, b| b.cmp(a));
        assert!(set.is_empty());
        assert!(set.comparator().is_some());
        assert!(ImmutableSortedSet::<u8>::default().comparator().is_none());
    }

    #[test]
    fn set_with_comparator() {
        let set = immutable_sorted_set_by(vec![1, 5, 3, 5], |a: &i32, b: &i32| b.cmp(a));
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![5, 3, 1]);
        assert_eq!(set.first(), Some(&5));
        assert_eq!(set.last(), Some(&1));
        assert!(set.contains(&3));
        assert!(!set.contains(&4));
    }

    #[test]
    fn set_keeps_first_equal_element() {
        let set = immutable_sorted_set_by(vec!["b", "A", "a"], |a: &&str, b: &&str| {
            a.to_lowercase().cmp(&b.to_lowercase())
        });
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec!["A", "b"]);
    }

    #[test]
    fn serializes_in_order() {
        let map = immutable_sorted_map_of([("b", 1), ("a", 2)]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"a":2,"b":1}"#);

        let set = immutable_sorted_set_of([3, 1, 2]);
        assert_eq!(serde_json::to_string(&set).unwrap(), "[1,2,3]");
    }

    proptest! {
        #[test]
        fn property_test_set_matches_btreeset(input in any::<Vec<i16>>()) {
            let set = immutable_sorted_set_of(input.iter().copied());
            let expected = input.iter().copied().collect::<std::collections::BTreeSet<_>>();

            prop_assert_eq!(set.iter().copied().collect::<Vec<_>>(), expected.into_iter().collect::<Vec<_>>());
        }

        #[test]
        fn property_test_map_matches_btreemap(input in any::<Vec<(u8, u32)>>()) {
            let map = immutable_sorted_map_of(input.iter().copied());
            let expected = input.iter().copied().collect::<std::collections::BTreeMap<_, _>>();

            prop_assert_eq!(map.len(), expected.len());
            for (k, v) in &expected {
                prop_assert_eq!(map.get(k), Some(v));
            }
        }
    }
}
