//! [SeqMap] is a hash map that maintains an explicit, caller-controlled order of its entries.
use crate::pos_table;
use core::hash::Hash;
use pos_table::PosTable;
use std::{borrow::Borrow, cmp::Ordering, collections::HashMap, fmt, hash::BuildHasher};

/// Error returned by operations that reject conflicting keys or a mismatched key sequence.
///
/// Positional indices outside the valid range are a caller bug rather than a runtime condition;
/// the accessors panic on them instead of returning this error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeqMapError<K> {
    /// The supplied key sequence does not have exactly the same keys as the supplied mapping.
    KeysMismatch,
    /// A pair sequence contained the same key twice.
    DuplicateKey(K),
    /// The key to append is already present in the map.
    AppendConflict(K),
    /// The key to insert is already present in the map.
    InsertConflict(K),
}

impl<K: fmt::Debug> fmt::Display for SeqMapError<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeqMapError::KeysMismatch => {
                write!(f, "key sequence does not match the mapping's key set")
            }
            SeqMapError::DuplicateKey(key) => {
                write!(f, "pair sequence contains key {key:?} twice")
            }
            SeqMapError::AppendConflict(key) => {
                write!(f, "cannot append key {key:?}, it is already present")
            }
            SeqMapError::InsertConflict(key) => {
                write!(f, "cannot insert key {key:?}, it is already present")
            }
        }
    }
}

impl<K: fmt::Debug> std::error::Error for SeqMapError<K> {}

/// A hash map that maintains an explicit, caller-controlled order of its entries.
///
/// The order is fixed at construction time (sorted with a comparator, adopted from an explicit
/// key sequence, or taken from a sequence of pairs) and maintained across mutation: updating a
/// value keeps the entry's position, new keys join at the tail and removals shift later entries
/// down by one position.
///
/// In `SeqMap<K, V, S>`, `K: Hash + Eq` is the key type, `V` the value type and
/// `S: BuildHasher` is used for hashing keys.
///
/// The map performs no internal synchronization; sharing it mutably across threads requires an
/// external lock around the whole map.
#[derive(Clone)]
pub struct SeqMap<K, V, S> {
    pos_table: PosTable,
    entries: Vec<(K, V)>,
    build_hasher: S,
}

impl<K, V, S: Default> Default for SeqMap<K, V, S> {
    fn default() -> Self {
        SeqMap {
            pos_table: PosTable::default(),
            entries: Vec::new(),
            build_hasher: S::default(),
        }
    }
}

impl<K, V, S: Default> SeqMap<K, V, S> {
    /// Returns an empty map.
    pub fn new() -> Self {
        Self::default()
    }
    /// Returns an empty map with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        SeqMap {
            pos_table: PosTable::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
            build_hasher: S::default(),
        }
    }
}

impl<K, V, S> SeqMap<K, V, S> {
    /// Returns an empty map with the provided BuildHasher.
    pub fn with_hasher(build_hasher: S) -> Self {
        SeqMap {
            pos_table: PosTable::default(),
            entries: Vec::new(),
            build_hasher,
        }
    }
    /// Returns an empty map with the specified capacity and provided BuildHasher.
    pub fn with_capacity_and_hasher(capacity: usize, build_hasher: S) -> Self {
        SeqMap {
            pos_table: PosTable::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
            build_hasher,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for SeqMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display, S> fmt::Display for SeqMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.entries.iter().enumerate() {
            writeln!(f, "{index}: {key}: {value}")?;
        }
        Ok(())
    }
}

impl<K, V, S> SeqMap<K, V, S> {
    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// Returns a reference to a slice containing all key-value pairs in order.
    pub fn as_slice(&self) -> &[(K, V)] {
        &self.entries[..]
    }
    /// Removes all entries from the map, but keeps the allocated memory.
    pub fn clear(&mut self) {
        self.pos_table.clear();
        self.entries.clear();
    }
    /// Returns an iterator over all key-value pairs in order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.entries.iter(),
        }
    }
    /// Returns an iterator over all keys in order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.entries.iter(),
        }
    }
    /// Returns an iterator over all values in order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.entries.iter(),
        }
    }
    /// Returns an iterator over all values in order, allowing mutation.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.entries.iter_mut(),
        }
    }
    /// Returns an iterator over all key-value pairs in order, allowing mutation of values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.entries.iter_mut(),
        }
    }
}

impl<K: Hash, V, S: BuildHasher> SeqMap<K, V, S> {
    /// Reserves memory for an extra `additional` entries.
    pub fn reserve(&mut self, additional: usize) {
        self.entries.reserve(additional);
        self.pos_table.reserve(additional, |pos| {
            self.build_hasher.hash_one(&self.entries[pos].0)
        });
    }
    // The key must not be present; callers have already ruled out an equal key.
    fn push_unchecked(&mut self, key: K, value: V) {
        self.pos_table.grow_for(self.entries.len(), |pos| {
            self.build_hasher.hash_one(&self.entries[pos].0)
        });
        let hash = self.build_hasher.hash_one(&key);
        self.entries.push((key, value));
        let pos = self.entries.len() - 1;
        self.pos_table.insert_unique(hash, pos, |pos| {
            self.build_hasher.hash_one(&self.entries[pos].0)
        });
    }
}

impl<K: Hash + Eq, V, S: BuildHasher + Default> SeqMap<K, V, S> {
    /// Builds a map from an unordered mapping, ordering the entries by sorting the keys with
    /// `cmp`.
    pub fn sorted_by<S2>(
        mapping: HashMap<K, V, S2>,
        mut cmp: impl FnMut(&K, &K) -> Ordering,
    ) -> Self {
        let mut pairs: Vec<(K, V)> = mapping.into_iter().collect();
        pairs.sort_unstable_by(|a, b| cmp(&a.0, &b.0));
        let mut map = Self::with_capacity(pairs.len());
        for (key, value) in pairs {
            map.push_unchecked(key, value);
        }
        map
    }
    /// Builds a map from an unordered mapping, ordering the entries by the natural order of the
    /// keys.
    pub fn sorted<S2>(mapping: HashMap<K, V, S2>) -> Self
    where
        K: Ord,
    {
        Self::sorted_by(mapping, K::cmp)
    }
    /// Builds a map from an unordered mapping, adopting the supplied key sequence as the order
    /// verbatim.
    ///
    /// Fails with [`SeqMapError::KeysMismatch`] unless the sequence contains exactly the keys of
    /// the mapping, each of them once. Extra, missing and repeated sequence keys are all rejected.
    pub fn with_key_order<S2: BuildHasher>(
        mut mapping: HashMap<K, V, S2>,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<Self, SeqMapError<K>> {
        let mut map = Self::with_capacity(mapping.len());
        for key in keys {
            let Some(value) = mapping.remove(&key) else {
                return Err(SeqMapError::KeysMismatch);
            };
            map.push_unchecked(key, value);
        }
        if !mapping.is_empty() {
            return Err(SeqMapError::KeysMismatch);
        }
        Ok(map)
    }
    /// Builds a map from a sequence of key-value pairs, adopting the sequence order.
    ///
    /// Fails with [`SeqMapError::DuplicateKey`] on the first repeated key, consuming no further
    /// pairs. The whole construction is rejected in that case.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, SeqMapError<K>> {
        let iter = pairs.into_iter();
        let (lower_bound, _) = iter.size_hint();
        let mut map = Self::with_capacity(lower_bound);
        for (key, value) in iter {
            map.pos_table.grow_for(map.entries.len(), |pos| {
                map.build_hasher.hash_one(&map.entries[pos].0)
            });
            let hash = map.build_hasher.hash_one(&key);
            match map.pos_table.entry(
                hash,
                |pos| map.entries[pos].0 == key,
                |pos| map.build_hasher.hash_one(&map.entries[pos].0),
            ) {
                pos_table::Entry::Occupied(_) => return Err(SeqMapError::DuplicateKey(key)),
                pos_table::Entry::Vacant(entry) => {
                    let pos = map.entries.len();
                    map.entries.push((key, value));
                    entry.insert(pos);
                }
            }
        }
        Ok(map)
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> SeqMap<K, V, S> {
    /// Inserts `value` at `key`, replacing any previous value.
    /// Returns the index of the entry and any previous value.
    ///
    /// An existing key keeps its position; a new key-value pair joins at the tail.
    pub fn insert_full(&mut self, key: K, value: V) -> (usize, Option<V>) {
        self.pos_table.grow_for(self.entries.len(), |pos| {
            self.build_hasher.hash_one(&self.entries[pos].0)
        });
        let hash = self.build_hasher.hash_one(&key);
        match self.pos_table.entry(
            hash,
            |pos| self.entries[pos].0 == key,
            |pos| self.build_hasher.hash_one(&self.entries[pos].0),
        ) {
            pos_table::Entry::Occupied(entry) => {
                let pos = entry.get();
                let old_value = std::mem::replace(&mut self.entries[pos].1, value);
                (pos, Some(old_value))
            }
            pos_table::Entry::Vacant(entry) => {
                let pos = self.entries.len();
                self.entries.push((key, value));
                entry.insert(pos);
                (pos, None)
            }
        }
    }
    /// Inserts `value` at `key`, replacing and returning any previous value.
    ///
    /// An existing key keeps its position; a new key-value pair joins at the tail.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.insert_full(key, value).1
    }
    /// Adds a key-value pair at the tail of the map.
    ///
    /// Fails with [`SeqMapError::AppendConflict`] if the key is already present, leaving the map
    /// unchanged.
    pub fn append(&mut self, key: K, value: V) -> Result<(), SeqMapError<K>> {
        if self.contains_key(&key) {
            return Err(SeqMapError::AppendConflict(key));
        }
        self.push_unchecked(key, value);
        Ok(())
    }
    /// Splices a key-value pair into the order at position `index`, shifting later entries up by
    /// one position.
    ///
    /// Fails with [`SeqMapError::InsertConflict`] if the key is already present, leaving the map
    /// unchanged. Panics if `index > len`.
    pub fn insert_at(&mut self, index: usize, key: K, value: V) -> Result<(), SeqMapError<K>> {
        assert!(
            index <= self.entries.len(),
            "insertion index {index} is > length {}",
            self.entries.len()
        );
        if self.contains_key(&key) {
            return Err(SeqMapError::InsertConflict(key));
        }
        self.pos_table.grow_for(self.entries.len(), |pos| {
            self.build_hasher.hash_one(&self.entries[pos].0)
        });
        let hash = self.build_hasher.hash_one(&key);
        self.pos_table.open_gap(index);
        self.entries.insert(index, (key, value));
        self.pos_table.insert_unique(hash, index, |pos| {
            self.build_hasher.hash_one(&self.entries[pos].0)
        });
        Ok(())
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> SeqMap<K, V, S> {
    /// Returns the index of the entry with the specified key, if it exists.
    pub fn get_index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let hash = self.build_hasher.hash_one(key);
        self.pos_table
            .find(hash, |pos| self.entries[pos].0.borrow() == key)
    }
    /// Returns the index and references to the key and value of the entry with the specified key,
    /// if it exists.
    pub fn get_full<Q>(&self, key: &Q) -> Option<(usize, &K, &V)>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.get_index_of(key).map(|pos| {
            let entry = &self.entries[pos];
            (pos, &entry.0, &entry.1)
        })
    }
    /// Returns a reference to the value corresponding to the specified key, if it exists.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.get_full(key).map(|x| x.2)
    }
    /// Returns a mutable reference to the value corresponding to the specified key, if it exists.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.get_index_of(key).map(|pos| &mut self.entries[pos].1)
    }
    /// Returns a reference to the key and value with the specified index, if it exists.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.entries.get(index).map(|entry| (&entry.0, &entry.1))
    }
    /// Returns a mutable reference to the value with the specified index, if it exists.
    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut V> {
        self.entries.get_mut(index).map(|entry| &mut entry.1)
    }
    /// Returns `true` if the map contains the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.get_index_of(key).is_some()
    }
    /// Returns `true` if any key in the map satisfies `pred`.
    pub fn contains_key_where(&self, mut pred: impl FnMut(&K) -> bool) -> bool {
        self.entries.iter().any(|(key, _)| pred(key))
    }
    /// Returns `true` if any value in the map satisfies `pred`.
    pub fn contains_value_where(&self, mut pred: impl FnMut(&V) -> bool) -> bool {
        self.entries.iter().any(|(_, value)| pred(value))
    }
    /// Returns `true` if any value in the map equals `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.contains_value_where(|candidate| candidate == value)
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> SeqMap<K, V, S> {
    /// Returns a reference to the value at position `index`. Panics if `index >= len`.
    pub fn value_at(&self, index: usize) -> &V {
        &self.entries[index].1
    }
    /// Replaces the value at position `index`, returning the previous value. The key and the
    /// order are untouched. Panics if `index >= len`.
    pub fn set_value_at(&mut self, index: usize, value: V) -> V {
        std::mem::replace(&mut self.entries[index].1, value)
    }
    /// Returns references to the key and value at position `index`. Panics if `index >= len`.
    pub fn pair_at(&self, index: usize) -> (&K, &V) {
        let entry = &self.entries[index];
        (&entry.0, &entry.1)
    }
    /// Replaces the pair at position `index`, returning the displaced pair.
    ///
    /// If `key` already lives at a different position, that prior occurrence is removed from the
    /// map entirely: its slot collapses, later entries shift down one position and the length
    /// decreases by one. The incoming pair ends up at `index`, or one position lower when the
    /// collapsed slot preceded it. Panics if `index >= len`.
    pub fn set_pair_at(&mut self, index: usize, key: K, value: V) -> (K, V) {
        assert!(
            index < self.entries.len(),
            "index {index} is >= length {}",
            self.entries.len()
        );
        let hash = self.build_hasher.hash_one(&key);
        let prior = self
            .pos_table
            .find(hash, |pos| self.entries[pos].0 == key)
            .filter(|&at| at != index);
        let displaced_hash = self.build_hasher.hash_one(&self.entries[index].0);
        self.pos_table
            .find_entry(displaced_hash, |pos| pos == index)
            .unwrap()
            .remove();
        let displaced = std::mem::replace(&mut self.entries[index], (key, value));
        let index = match prior {
            Some(at) => {
                self.pos_table.remove_shift(at);
                self.entries.remove(at);
                if at < index {
                    index - 1
                } else {
                    index
                }
            }
            None => index,
        };
        self.pos_table.insert_unique(hash, index, |pos| {
            self.build_hasher.hash_one(&self.entries[pos].0)
        });
        displaced
    }
    /// Removes the entry with the specified key and returns its index, key and value, if it
    /// exists. Later entries shift down one position.
    pub fn remove_full<Q>(&mut self, key: &Q) -> Option<(usize, K, V)>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let pos = self.get_index_of(key)?;
        self.pos_table.remove_shift(pos);
        let (key, value) = self.entries.remove(pos);
        Some((pos, key, value))
    }
    /// Removes the entry with the specified key and returns its value, if it exists. Later
    /// entries shift down one position.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.remove_full(key).map(|x| x.2)
    }
    /// Removes and returns the pair at position `index`. Later entries shift down one position.
    /// Panics if `index >= len`.
    pub fn remove_at(&mut self, index: usize) -> (K, V) {
        assert!(
            index < self.entries.len(),
            "index {index} is >= length {}",
            self.entries.len()
        );
        self.pos_table.remove_shift(index);
        self.entries.remove(index)
    }
    /// Verifies that the entry vector and the position table are in sync: equal lengths, every
    /// position findable under its key's hash and no key stored twice.
    ///
    /// Meant for tests and diagnostics; every mutating operation leaves this check passing.
    pub fn check_consistency(&self) -> Result<(), SeqMapError<K>> {
        if self.pos_table.len() != self.entries.len() {
            return Err(SeqMapError::KeysMismatch);
        }
        for (index, (key, _)) in self.entries.iter().enumerate() {
            let hash = self.build_hasher.hash_one(key);
            let found = self.pos_table.find(hash, |pos| {
                self.entries
                    .get(pos)
                    .is_some_and(|(candidate, _)| candidate == key)
            });
            if found != Some(index) {
                return Err(SeqMapError::KeysMismatch);
            }
        }
        Ok(())
    }
}

impl<K: PartialEq, V: PartialEq, S1, S2> PartialEq<SeqMap<K, V, S2>> for SeqMap<K, V, S1> {
    fn eq(&self, other: &SeqMap<K, V, S2>) -> bool {
        self.entries == other.entries
    }
}

impl<K: Eq, V: Eq, S> Eq for SeqMap<K, V, S> {}

impl<K: Hash + Eq, V, S: BuildHasher> Extend<(K, V)> for SeqMap<K, V, S> {
    fn extend<IntoIter: IntoIterator<Item = (K, V)>>(&mut self, iter: IntoIter) {
        let iter = iter.into_iter();
        let (lower_bound, _) = iter.size_hint();
        self.reserve(lower_bound);
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Hash + Eq, V, S: BuildHasher + Default> FromIterator<(K, V)> for SeqMap<K, V, S> {
    fn from_iter<IntoIter: IntoIterator<Item = (K, V)>>(iter: IntoIter) -> Self {
        let iter = iter.into_iter();
        let (lower_bound, _) = iter.size_hint();
        let mut map = SeqMap::with_capacity(lower_bound);
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

macro_rules! impl_iterator {
    () => {
        impl_iterator!(|x| x);
    };
    ($f: expr) => {
        fn next(&mut self) -> Option<Self::Item> {
            self.inner.next().map($f)
        }
        fn size_hint(&self) -> (usize, Option<usize>) {
            self.inner.size_hint()
        }
        fn count(self) -> usize {
            self.inner.count()
        }
        fn nth(&mut self, n: usize) -> Option<Self::Item> {
            self.inner.nth(n).map($f)
        }
        fn last(self) -> Option<Self::Item> {
            self.inner.last().map($f)
        }
    };
}

/// An iterator over the entries of a [`SeqMap`].
///
/// This struct is created by the [`iter`](`SeqMap::iter`) method on [`SeqMap`].
pub struct Iter<'a, K, V> {
    inner: std::slice::Iter<'a, (K, V)>,
}
impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    impl_iterator!(|entry| (&entry.0, &entry.1));
}

/// An iterator over the keys of a [`SeqMap`].
///
/// This struct is created by the [`keys`](`SeqMap::keys`) method on [`SeqMap`].
pub struct Keys<'a, K, V> {
    inner: std::slice::Iter<'a, (K, V)>,
}
impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    impl_iterator!(|entry| &entry.0);
}

/// An iterator over the values of a [`SeqMap`].
///
/// This struct is created by the [`values`](`SeqMap::values`) method on [`SeqMap`].
pub struct Values<'a, K, V> {
    inner: std::slice::Iter<'a, (K, V)>,
}
impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    impl_iterator!(|entry| &entry.1);
}

/// An iterator over the values of a [`SeqMap`], allowing mutation.
///
/// This struct is created by the [`values_mut`](`SeqMap::values_mut`) method on [`SeqMap`].
pub struct ValuesMut<'a, K, V> {
    inner: std::slice::IterMut<'a, (K, V)>,
}
impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;
    impl_iterator!(|entry| &mut entry.1);
}

/// An iterator over the entries of a [`SeqMap`], allowing mutation of values.
///
/// This struct is created by the [`iter_mut`](`SeqMap::iter_mut`) method on [`SeqMap`].
pub struct IterMut<'a, K, V> {
    inner: std::slice::IterMut<'a, (K, V)>,
}
impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    impl_iterator!(|entry| (&entry.0, &mut entry.1));
}

/// An iterator moving entries out of a [`SeqMap`].
///
/// This struct is created by the `into_iter` method on [`SeqMap`].
pub struct IntoIter<K, V> {
    inner: std::vec::IntoIter<(K, V)>,
}
impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    impl_iterator!();
}

impl<K, V, S> IntoIterator for SeqMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.entries.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a SeqMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut SeqMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
