//! #   The HashMap.
//!
//! An open-addressing hash map with bounded, hopscotch-style probing: every
//! key lives within `hop_range` slots of its natural index
//! (`key_hash % capacity`, wrapping around the end of the slot array).
//!
//! ##  Under the covers.
//!
//! The slots are a single contiguous array, each either empty or holding one
//! key-value pair. There are no tombstones: removing a key simply empties its
//! slot, and later insertions may reuse it.
//!
//! The map grows by doubling its capacity, either when an insertion would push
//! the load factor above the configured threshold, or when a key finds no free
//! slot within its hop window. Growing relocates every entry to its natural
//! index in the new array. Each candidate capacity is planned in full, the new
//! key included, before anything moves, so an entry is never dropped. When no
//! plan fits after a bounded number of extra doublings the operation fails with
//! [`Error::HopWindowExhausted`] and the map is left as it was, capacity
//! included.
//!
//! #   Example: basic
//!
//! ```
//! use shelving::HashMap;
//!
//! let mut map = HashMap::new(8, 0.7);
//! for key in 1..=20u32 {
//!     map.insert(key, key * 10);
//! }
//!
//! assert_eq!(20, map.len());
//! assert!(map.capacity() > 8);
//! assert!(map.load_factor() <= 0.7);
//! assert_eq!(Some(&70), map.search(&7));
//!
//! assert!(map.remove(&7));
//! assert_eq!(None, map.search(&7));
//! ```
//!
//! #   Example: indexing
//!
//! `get_or_insert_default` auto-vivifies missing keys, which makes tallies
//! straightforward:
//!
//! ```
//! use shelving::HashMap;
//!
//! let mut tally: HashMap<String, u32> = HashMap::default();
//! for word in "a b a c a b".split(' ') {
//!     *tally.get_or_insert_default(word.to_string()) += 1;
//! }
//!
//! assert_eq!(Some(&3), tally.search("a"));
//! assert_eq!(Some(&2), tally.search("b"));
//! assert_eq!(Some(&1), tally.search("c"));
//! ```
//!
//! #   Concurrency
//!
//! The map is a plain owned value; mutation requires `&mut self`. Sharing one
//! across threads requires an external lock.

use std::borrow::Borrow;
use std::{fmt, iter, mem, slice, vec};

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::key_hash::KeyHash;

/// Capacity used by [`Config::default`].
pub const DEFAULT_CAPACITY: usize = 16;

/// Load factor threshold used by [`Config::default`].
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Hop range used by [`Config::default`].
pub const DEFAULT_HOP_RANGE: usize = 32;

/// Extra doublings attempted before giving up on placing a key.
const MAX_GROWTH_STEPS: u32 = 4;

/// Construction parameters of a [`HashMap`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Initial number of slots.
    pub capacity: usize,
    /// Growth is triggered when `len / capacity` would exceed this value.
    pub load_factor_threshold: f64,
    /// Maximum distance between a key's natural index and its slot.
    pub hop_range: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            load_factor_threshold: DEFAULT_LOAD_FACTOR,
            hop_range: DEFAULT_HOP_RANGE,
        }
    }
}

impl Config {
    /// Checks that a map can be built from this configuration.
    ///
    /// ```
    /// use shelving::Error;
    /// use shelving::hash_map::Config;
    ///
    /// assert_eq!(Ok(()), Config::default().validate());
    ///
    /// let config = Config { capacity: 0, ..Config::default() };
    /// assert_eq!(Err(Error::ZeroCapacity), config.validate());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        //  Written so that NaN is rejected too.
        if !(self.load_factor_threshold > 0.0 && self.load_factor_threshold <= 1.0) {
            return Err(Error::LoadFactorOutOfRange(self.load_factor_threshold));
        }
        if self.hop_range == 0 {
            return Err(Error::ZeroHopRange);
        }
        Ok(())
    }
}

type Slot<K, V> = Option<(K, V)>;

/// `HashMap`
///
/// A key-value map using bounded linear probing. Keys are unique: inserting a
/// key which is already present replaces its value.
#[derive(Clone)]
pub struct HashMap<K, V> {
    slots: Vec<Slot<K, V>>,
    //  Number of occupied slots.
    len: usize,
    load_factor_threshold: f64,
    hop_range: usize,
}

impl<K, V> HashMap<K, V> {
    /// Creates an empty map with `capacity` slots, growing whenever the load
    /// factor would exceed `load_factor_threshold`.
    ///
    /// The hop range is [`DEFAULT_HOP_RANGE`].
    ///
    /// #   Errors
    ///
    /// Returns an error if `capacity` is 0, or if `load_factor_threshold` is
    /// not within `(0, 1]`.
    pub fn try_new(capacity: usize, load_factor_threshold: f64) -> Result<Self> {
        Self::try_with_config(Config {
            capacity,
            load_factor_threshold,
            ..Config::default()
        })
    }

    /// Creates an empty map with `capacity` slots, growing whenever the load
    /// factor would exceed `load_factor_threshold`.
    ///
    /// #   Panics
    ///
    /// Panics if `capacity` is 0, or if `load_factor_threshold` is not within
    /// `(0, 1]`.
    pub fn new(capacity: usize, load_factor_threshold: f64) -> Self {
        match Self::try_new(capacity, load_factor_threshold) {
            Ok(map) => map,
            Err(error) => panic!("invalid hash map configuration: {}", error),
        }
    }

    /// Creates an empty map with at least `capacity` slots and the default
    /// threshold and hop range.
    ///
    /// A capacity of 0 is rounded up to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_valid_config(Config {
            capacity: capacity.max(1),
            ..Config::default()
        })
    }

    /// Creates an empty map from a full configuration.
    ///
    /// #   Errors
    ///
    /// Returns the first violation reported by [`Config::validate`].
    pub fn try_with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: Config) -> Self {
        Self {
            slots: iter::repeat_with(|| None).take(config.capacity).collect(),
            len: 0,
            load_factor_threshold: config.load_factor_threshold,
            hop_range: config.hop_range,
        }
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the hop range.
    pub fn hop_range(&self) -> usize {
        self.hop_range
    }

    /// Returns the load factor threshold.
    pub fn load_factor_threshold(&self) -> f64 {
        self.load_factor_threshold
    }

    /// Returns the ratio of occupied slots to capacity.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    /// Removes every entry, keeping the current capacity.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.len = 0;
    }

    /// Iterates over the entries, in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.len,
        }
    }

    /// Iterates over the entries, in slot order, with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            slots: self.slots.iter_mut(),
            remaining: self.len,
        }
    }

    /// Iterates over the keys, in slot order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Iterates over the values, in slot order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    //  Number of slots probed from a natural index.
    fn window(&self) -> usize {
        self.hop_range.min(self.capacity())
    }

    fn home(&self, hash: u64) -> usize {
        natural_index(hash, self.capacity())
    }

    fn exceeds_threshold(&self, len: usize, capacity: usize) -> bool {
        len as f64 / capacity as f64 > self.load_factor_threshold
    }

    fn value_at_mut(&mut self, index: usize) -> &mut V {
        match &mut self.slots[index] {
            Some((_, value)) => value,
            None => unreachable!("slot {} was located as occupied", index),
        }
    }
}

impl<K: KeyHash + Eq, V> HashMap<K, V> {
    /// Inserts a key-value pair, growing the map as necessary.
    ///
    /// If the key was already present its value is replaced, and the previous
    /// value is returned.
    ///
    /// #   Errors
    ///
    /// Returns [`Error::HopWindowExhausted`] if the key cannot be placed within
    /// its hop window even after growing, and [`Error::CapacityOverflow`] if
    /// growing is impossible. In either case the map, capacity included, is
    /// left unchanged.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        if let Some(index) = self.find_index(&key) {
            return Ok(Some(mem::replace(self.value_at_mut(index), value)));
        }

        self.insert_new(key, value)?;
        Ok(None)
    }

    /// Inserts a key-value pair, growing the map as necessary.
    ///
    /// If the key was already present its value is replaced, and the previous
    /// value is returned.
    ///
    /// #   Panics
    ///
    /// Panics if `try_insert` fails.
    ///
    /// #   Example
    ///
    /// ```
    /// use shelving::HashMap;
    ///
    /// let mut map = HashMap::default();
    /// assert_eq!(None, map.insert("ten", 10));
    /// assert_eq!(Some(10), map.insert("ten", 11));
    /// assert_eq!(1, map.len());
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.try_insert(key, value) {
            Ok(previous) => previous,
            Err(error) => panic!("hash map insertion failed: {}", error),
        }
    }

    /// Returns a reference to the value of `key`, if present.
    pub fn search<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: KeyHash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        self.slots[index].as_ref().map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value of `key`, if present.
    pub fn search_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: KeyHash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        self.slots[index].as_mut().map(|(_, v)| v)
    }

    /// Returns whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: KeyHash + Eq + ?Sized,
    {
        self.find_index(key).is_some()
    }

    /// Replaces the value of `key`, if present.
    ///
    /// Returns whether the key was found. A missing key is not inserted.
    pub fn update_value_for_key<Q>(&mut self, key: &Q, value: V) -> bool
    where
        K: Borrow<Q>,
        Q: KeyHash + Eq + ?Sized,
    {
        match self.search_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Returns the value of `key`, inserting `V::default()` first if absent.
    ///
    /// #   Errors
    ///
    /// Fails as [`try_insert`](Self::try_insert) does when the key is absent.
    pub fn try_get_or_insert_default(&mut self, key: K) -> Result<&mut V>
    where
        V: Default,
    {
        match self.find_index(&key) {
            Some(index) => Ok(self.value_at_mut(index)),
            None => self.insert_new(key, V::default()),
        }
    }

    /// Returns the value of `key`, inserting `V::default()` first if absent.
    ///
    /// #   Panics
    ///
    /// Panics if `try_get_or_insert_default` fails.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        match self.try_get_or_insert_default(key) {
            Ok(value) => value,
            Err(error) => panic!("hash map insertion failed: {}", error),
        }
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: KeyHash + Eq + ?Sized,
    {
        self.take(key).is_some()
    }

    /// Removes `key`, returning its value if it was present.
    ///
    /// The slot is left empty; nothing is moved.
    pub fn take<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: KeyHash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        let (_, value) = self.slots[index].take()?;
        self.len -= 1;
        Some(value)
    }

    //  Probes the whole hop window: removal leaves gaps, so the first empty
    //  slot does not end the neighbourhood.
    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: KeyHash + Eq + ?Sized,
    {
        let capacity = self.capacity();
        let home = self.home(key.key_hash());

        (0..self.window())
            .map(|hop| (home + hop) % capacity)
            .find(|&index| matches!(&self.slots[index], Some((k, _)) if <K as Borrow<Q>>::borrow(k) == key))
    }

    //  Inserts a key known to be absent.
    fn insert_new(&mut self, key: K, value: V) -> Result<&mut V> {
        let index = self.place(key.key_hash())?;
        self.len += 1;

        let (_, value) = self.slots[index].insert((key, value));
        Ok(value)
    }

    //  Finds a free slot for `hash`, growing first when the load factor or the
    //  hop window requires it. The slots are only replaced once a capacity is
    //  found where every entry and the new key fit; on error nothing changed.
    fn place(&mut self, hash: u64) -> Result<usize> {
        let from = self.capacity();
        let mut target = from;

        while self.exceeds_threshold(self.len + 1, target) {
            target = target.checked_mul(2).ok_or(Error::CapacityOverflow)?;
        }

        for step in 0..=MAX_GROWTH_STEPS {
            if step > 0 {
                trace!(capacity = target, "no room for the new key, doubling again");
                target = target.checked_mul(2).ok_or(Error::CapacityOverflow)?;
            }

            if target == from {
                if let Some(index) = find_free_slot(|i| self.slots[i].is_some(), self.home(hash), self.window(), from) {
                    return Ok(index);
                }
                continue;
            }

            if let Some((plan, index)) = self.plan_relocation(target, hash) {
                self.relocate(target, plan);
                debug!(from, to = target, len = self.len, "hash map grown");
                return Ok(index);
            }
        }

        warn!(capacity = from, len = self.len, "hop window exhausted");
        Err(Error::HopWindowExhausted { capacity: from })
    }

    //  Computes the `(from, to)` moves relocating every entry into an array of
    //  `capacity` slots, and the slot left for a new key hashing to `hash`.
    //  `None` if anything would fall outside its window.
    fn plan_relocation(&self, capacity: usize, hash: u64) -> Option<(Vec<(usize, usize)>, usize)> {
        let window = self.hop_range.min(capacity);
        let mut occupied = vec![false; capacity];
        let mut plan = Vec::with_capacity(self.len);

        for (from, slot) in self.slots.iter().enumerate() {
            let Some((key, _)) = slot else { continue };

            let home = natural_index(key.key_hash(), capacity);
            let to = find_free_slot(|i| occupied[i], home, window, capacity)?;

            occupied[to] = true;
            plan.push((from, to));
        }

        let index = find_free_slot(|i| occupied[i], natural_index(hash, capacity), window, capacity)?;
        Some((plan, index))
    }

    fn relocate(&mut self, capacity: usize, plan: Vec<(usize, usize)>) {
        let mut slots: Vec<Slot<K, V>> = iter::repeat_with(|| None).take(capacity).collect();

        for (from, to) in plan {
            slots[to] = self.slots[from].take();
        }

        self.slots = slots;
    }
}

impl<K, V> Default for HashMap<K, V> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for HashMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: KeyHash + Eq, V> Extend<(K, V)> for HashMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, entries: I) {
        for (key, value) in entries {
            self.insert(key, value);
        }
    }
}

impl<K: KeyHash + Eq, V> FromIterator<(K, V)> for HashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(entries: I) -> Self {
        let mut map = Self::default();
        map.extend(entries);
        map
    }
}

impl<'a, K, V> IntoIterator for &'a HashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut HashMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V> IntoIterator for HashMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            slots: self.slots.into_iter(),
            remaining: self.len,
        }
    }
}

/// Iterator over the entries of a [`HashMap`], in slot order.
#[derive(Clone)]
pub struct Iter<'a, K, V> {
    slots: slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.slots.find_map(|slot| slot.as_ref().map(|(k, v)| (k, v)))?;
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over the entries of a [`HashMap`], with mutable values.
pub struct IterMut<'a, K, V> {
    slots: slice::IterMut<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.slots.find_map(|slot| slot.as_mut().map(|(k, v)| (&*k, v)))?;
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Owning iterator over the entries of a [`HashMap`].
pub struct IntoIter<K, V> {
    slots: vec::IntoIter<Slot<K, V>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.slots.find_map(|slot| slot)?;
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

fn natural_index(hash: u64, capacity: usize) -> usize {
    (hash % capacity as u64) as usize
}

//  Scans `window` slots from `start`, wrapping, for one that is not occupied.
fn find_free_slot<F>(is_occupied: F, start: usize, window: usize, capacity: usize) -> Option<usize>
where
    F: Fn(usize) -> bool,
{
    (0..window)
        .map(|hop| (start + hop) % capacity)
        .find(|&index| !is_occupied(index))
}

#[cfg(test)]
mod tests {

    use super::*;

    use ordermap::OrderMap;
    use proptest::prelude::*;

    //  A key whose hash is chosen by the test, to force collisions.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Pinned {
        id: u32,
        hash: u64,
    }

    impl Pinned {
        fn colliding(id: u32) -> Self {
            Self { id, hash: 3 }
        }
    }

    impl KeyHash for Pinned {
        fn key_hash(&self) -> u64 {
            self.hash
        }
    }

    fn small(capacity: usize, hop_range: usize) -> HashMap<Pinned, u32> {
        let config = Config {
            capacity,
            load_factor_threshold: 1.0,
            hop_range,
        };
        HashMap::try_with_config(config).unwrap()
    }

    //  Every entry sits within its hop window, and the cached length matches.
    fn assert_placement<K: KeyHash + Eq + fmt::Debug, V>(map: &HashMap<K, V>) {
        let capacity = map.capacity();
        let mut occupied = 0;

        for (index, slot) in map.slots.iter().enumerate() {
            let Some((key, _)) = slot else { continue };
            occupied += 1;

            let home = natural_index(key.key_hash(), capacity);
            let distance = (index + capacity - home) % capacity;
            assert!(distance < map.window(), "{:?} is {} slots from home", key, distance);
        }

        assert_eq!(occupied, map.len());
    }

    #[test]
    fn construction_rejects_degenerate_parameters() {
        assert_eq!(Some(Error::ZeroCapacity), HashMap::<u32, u32>::try_new(0, 0.5).err());
        assert_eq!(
            Some(Error::LoadFactorOutOfRange(0.0)),
            HashMap::<u32, u32>::try_new(8, 0.0).err()
        );
        assert_eq!(
            Some(Error::LoadFactorOutOfRange(1.25)),
            HashMap::<u32, u32>::try_new(8, 1.25).err()
        );
        assert!(HashMap::<u32, u32>::try_new(8, f64::NAN).is_err());
        assert!(HashMap::<u32, u32>::try_new(8, 1.0).is_ok());

        let config = Config { hop_range: 0, ..Config::default() };
        assert_eq!(Some(Error::ZeroHopRange), HashMap::<u32, u32>::try_with_config(config).err());
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 1")]
    fn new_panics_on_zero_capacity() {
        let _ = HashMap::<u32, u32>::new(0, 0.5);
    }

    #[test]
    fn with_capacity_rounds_zero_up() {
        let map = HashMap::<u32, u32>::with_capacity(0);
        assert_eq!(1, map.capacity());
        assert!(map.is_empty());
    }

    #[test]
    fn grows_past_threshold() {
        let mut map = HashMap::new(8, 0.7);

        for key in 1..=20u32 {
            map.insert(key, key);
            assert!(map.load_factor() <= 0.7, "load factor {} after {}", map.load_factor(), key);
        }

        assert!(map.capacity() >= 32);
        assert_eq!(20, map.len());
        for key in 1..=20u32 {
            assert_eq!(Some(&key), map.search(&key));
        }
        assert_placement(&map);
    }

    #[test]
    fn insert_overwrites_existing_key() {
        let mut map = HashMap::default();

        assert_eq!(None, map.insert(5u32, "five"));
        assert_eq!(Some("five"), map.insert(5, "FIVE"));

        assert_eq!(1, map.len());
        assert_eq!(Some(&"FIVE"), map.search(&5));
        assert_eq!(1, map.iter().count());
    }

    #[test]
    fn remove_and_take() {
        let mut map: HashMap<String, u32> = HashMap::default();
        map.insert("a".to_string(), 1);
        map.insert("b".to_string(), 2);

        assert!(map.remove("a"));
        assert!(!map.remove("a"));
        assert_eq!(Some(2), map.take("b"));
        assert_eq!(None, map.take("b"));
        assert!(map.is_empty());
    }

    #[test]
    fn lookup_crosses_gaps_left_by_removal() {
        let mut map = small(8, 4);
        let keys: Vec<Pinned> = (0..3).map(Pinned::colliding).collect();

        for (value, &key) in keys.iter().enumerate() {
            map.insert(key, value as u32);
        }

        //  The first of three colliding keys occupies the natural index; the
        //  other two sit after it.
        assert!(map.remove(&keys[0]));

        assert_eq!(Some(&1), map.search(&keys[1]));
        assert_eq!(Some(&2), map.search(&keys[2]));

        //  Reinserting an existing key must not fill the gap with a duplicate.
        assert_eq!(Some(2), map.insert(keys[2], 20));
        assert_eq!(2, map.len());
        assert_placement(&map);
    }

    #[test]
    fn full_window_forces_growth() {
        let mut map = small(8, 2);

        //  Three keys, two natural indexes 1 apart: the third cannot fit in a
        //  window of 2 without growing, after which 9 and 17 separate.
        map.insert(Pinned { id: 0, hash: 1 }, 0);
        map.insert(Pinned { id: 1, hash: 9 }, 1);
        assert_eq!(8, map.capacity());

        map.insert(Pinned { id: 2, hash: 17 }, 2);
        assert_eq!(16, map.capacity());

        for id in 0..3 {
            let hash = 1 + 8 * u64::from(id);
            assert_eq!(Some(&id), map.search(&Pinned { id, hash }));
        }
        assert_placement(&map);
    }

    #[test]
    fn exhaustion_fails_loudly_without_losing_entries() {
        let mut map = small(8, 4);

        for id in 0..4 {
            map.insert(Pinned::colliding(id), id);
        }

        let result = map.try_insert(Pinned::colliding(4), 4);
        assert!(matches!(result, Err(Error::HopWindowExhausted { .. })), "{:?}", result);

        assert_eq!(4, map.len());
        for id in 0..4 {
            assert_eq!(Some(&id), map.search(&Pinned::colliding(id)));
        }
        assert_eq!(None, map.search(&Pinned::colliding(4)));
        assert_eq!(8, map.capacity());
        assert_placement(&map);
    }

    #[test]
    fn repeated_exhaustion_keeps_capacity() {
        let mut map = small(8, 4);

        for id in 0..4 {
            map.insert(Pinned::colliding(id), id);
        }

        for id in 4..12 {
            let result = map.try_insert(Pinned::colliding(id), id);
            assert_eq!(Err(Error::HopWindowExhausted { capacity: 8 }), result);
            assert_eq!(8, map.capacity());
            assert_eq!(4, map.len());
        }

        for id in 0..4 {
            assert_eq!(Some(&id), map.search(&Pinned::colliding(id)));
        }
        assert_placement(&map);
    }

    #[test]
    fn exhaustion_after_load_growth_keeps_capacity() {
        let config = Config {
            capacity: 8,
            load_factor_threshold: 0.5,
            hop_range: 4,
        };
        let mut map = HashMap::try_with_config(config).unwrap();

        for id in 0..4 {
            map.insert(Pinned::colliding(id), id);
        }
        assert_eq!(8, map.capacity());

        //  The fifth entry crosses the threshold, yet no larger capacity fits it.
        let result = map.try_insert(Pinned::colliding(4), 4);
        assert_eq!(Err(Error::HopWindowExhausted { capacity: 8 }), result);
        assert_eq!(8, map.capacity());
        assert_eq!(4, map.len());
        assert_placement(&map);

        //  A key with a different home still triggers the growth.
        assert_eq!(Ok(None), map.try_insert(Pinned { id: 5, hash: 20 }, 5));
        assert_eq!(16, map.capacity());
        assert_eq!(5, map.len());
        assert_placement(&map);
    }

    //  Keys built from the blocks "Aa" and "BB", which fold to one hash.
    fn colliding_strings(count: usize) -> Vec<String> {
        (0..count)
            .map(|n| (0..6).map(|bit| if n >> bit & 1 == 0 { "Aa" } else { "BB" }).collect())
            .collect()
    }

    #[test]
    fn colliding_strings_exhaust_the_window() {
        let keys = colliding_strings(40);
        let mut map = HashMap::default();

        for (n, key) in keys.iter().take(DEFAULT_HOP_RANGE).enumerate() {
            assert_eq!(Ok(None), map.try_insert(key.clone(), n));
        }
        let capacity = map.capacity();

        for key in &keys[DEFAULT_HOP_RANGE..] {
            let result = map.try_insert(key.clone(), 0);
            assert_eq!(Err(Error::HopWindowExhausted { capacity }), result);
            assert_eq!(capacity, map.capacity());
        }

        assert_eq!(DEFAULT_HOP_RANGE, map.len());
        for (n, key) in keys.iter().take(DEFAULT_HOP_RANGE).enumerate() {
            assert_eq!(Some(&n), map.search(key.as_str()));
        }
        assert_placement(&map);
    }

    #[test]
    #[should_panic(expected = "hop window")]
    fn insert_panics_on_exhaustion() {
        let mut map = small(4, 1);
        map.insert(Pinned::colliding(0), 0);
        map.insert(Pinned::colliding(1), 1);
    }

    #[test]
    fn update_value_for_key_ignores_missing_keys() {
        let mut map = HashMap::default();
        map.insert(1u64, 1u64);

        assert!(map.update_value_for_key(&1, 10));
        assert!(!map.update_value_for_key(&2, 20));

        assert_eq!(Some(&10), map.search(&1));
        assert_eq!(None, map.search(&2));
        assert_eq!(1, map.len());
    }

    #[test]
    fn get_or_insert_default_vivifies() {
        let mut map: HashMap<&str, Vec<u32>> = HashMap::new(2, 0.5);

        map.get_or_insert_default("x").push(1);
        map.get_or_insert_default("x").push(2);
        map.get_or_insert_default("y");

        assert_eq!(Some(&vec![1, 2]), map.search(&"x"));
        assert_eq!(Some(&Vec::new()), map.search(&"y"));
        assert_eq!(2, map.len());
    }

    #[test]
    fn iteration_skips_empty_slots() {
        let mut map: HashMap<u32, u32> = (0..10).map(|k| (k, k * k)).collect();
        map.remove(&3);

        let mut entries: Vec<(u32, u32)> = map.iter().map(|(&k, &v)| (k, v)).collect();
        entries.sort_unstable();

        let expected: Vec<(u32, u32)> = (0..10).filter(|&k| k != 3).map(|k| (k, k * k)).collect();
        assert_eq!(expected, entries);
        assert_eq!(9, map.iter().len());

        for (_, value) in map.iter_mut() {
            *value += 1;
        }
        assert_eq!(Some(&5), map.search(&2));

        let mut owned: Vec<u32> = map.into_iter().map(|(k, _)| k).collect();
        owned.sort_unstable();
        assert_eq!(9, owned.len());
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut map: HashMap<u32, ()> = (0..100).map(|k| (k, ())).collect();
        let capacity = map.capacity();

        map.clear();

        assert!(map.is_empty());
        assert_eq!(capacity, map.capacity());
        assert_eq!(0, map.iter().count());
        assert!(!map.contains_key(&42));
    }

    #[test]
    fn debug_lists_entries() {
        let mut map = HashMap::new(4, 1.0);
        map.insert(1u8, 'a');
        assert_eq!("{1: 'a'}", format!("{:?}", map));
    }

    #[derive(Clone, Debug)]
    enum MapOp {
        Insert(u16, u32),
        Remove(u16),
        Search(u16),
    }

    fn map_op_strategy() -> impl Strategy<Value = MapOp> {
        prop_oneof![
            3 => (0u16..512, any::<u32>()).prop_map(|(k, v)| MapOp::Insert(k, v)),
            1 => (0u16..512).prop_map(MapOp::Remove),
            1 => (0u16..512).prop_map(MapOp::Search),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Replays random operations on both the HashMap and an OrderMap and
        /// asserts identical answers at every step.
        #[test]
        fn ops_match_ordermap(
            threshold in 0.3f64..=1.0,
            capacity in 1usize..32,
            ops in proptest::collection::vec(map_op_strategy(), 1..400),
        ) {
            let mut map = HashMap::new(capacity, threshold);
            let mut model: OrderMap<u16, u32> = OrderMap::new();

            for op in &ops {
                match *op {
                    MapOp::Insert(k, v) => {
                        prop_assert_eq!(model.insert(k, v), map.insert(k, v), "insert({})", k);
                        prop_assert!(map.load_factor() <= threshold);
                    }
                    MapOp::Remove(k) => {
                        prop_assert_eq!(model.remove(&k).is_some(), map.remove(&k), "remove({})", k);
                    }
                    MapOp::Search(k) => {
                        prop_assert_eq!(model.get(&k), map.search(&k), "search({})", k);
                    }
                }
                prop_assert_eq!(model.len(), map.len());
            }

            for (k, v) in &model {
                prop_assert_eq!(Some(v), map.search(k));
            }
            assert_placement(&map);
        }
    }
}
