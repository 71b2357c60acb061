//! OpenAddressingHashTable - double hashing over a flat array of tri-state slots
//!
//! Slot `i` of the probe sequence for a key is
//! `(h1 + i * h2) mod table_size` with `h2 = 1 + (h1 mod (table_size - 1))`.
//! The table size is always prime, so every probe sequence visits every slot.
//!
//! Removal leaves a tombstone ([`SlotState::Deleted`]). Lookups step over
//! tombstones and stop at the first empty slot; inserts reuse the first
//! tombstone they pass but keep probing until an empty slot so that a duplicate
//! further along the sequence is still detected.
//!
//! Failures on insert and remove are reported as values, not errors:
//!
//! ```rust
//! use lexmap::hash_map::{AddOutcome, OpenAddressingHashTable};
//!
//! let mut table = OpenAddressingHashTable::new();
//! assert_eq!(table.add("word", 1), AddOutcome::Inserted);
//! assert_eq!(table.add("word", 2), AddOutcome::Duplicate);
//! assert!(table.remove("word"));
//! assert!(!table.remove("word"));
//! ```

use super::primes::{clamped_table_size, fitted_size, table_size};
use crate::config::{Config, HashTableConfig};
use crate::error::{check_load_factor, LexmapError, Result};
use crate::statistics::{OpCounters, OpStats};
use ahash::RandomState;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::iter::FusedIterator;

/// Highest load factor an open-addressing table accepts. Each slot holds one
/// entry, so a threshold above this would never trigger growth.
pub const MAX_OCCUPANCY: f32 = 1.0;

/// State of a single slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Never used since the last rebuild; terminates lookups
    Empty,
    /// Holds a live entry
    Occupied,
    /// Tombstone left by a removal; lookups probe past it
    Deleted,
}

/// Result of [`OpenAddressingHashTable::add`]
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The entry was stored
    Inserted,
    /// The key was already present; nothing changed
    Duplicate,
    /// The whole probe cycle was exhausted without a free slot
    TableFull,
}

impl AddOutcome {
    /// Whether the entry was stored
    pub fn is_inserted(self) -> bool {
        self == AddOutcome::Inserted
    }
}

enum Slot<K, V> {
    Empty,
    Occupied(K, V),
    Deleted,
}

impl<K, V> Slot<K, V> {
    fn state(&self) -> SlotState {
        match self {
            Slot::Empty => SlotState::Empty,
            Slot::Occupied(..) => SlotState::Occupied,
            Slot::Deleted => SlotState::Deleted,
        }
    }

    fn value(&self) -> Option<&V> {
        match self {
            Slot::Occupied(_, v) => Some(v),
            _ => None,
        }
    }

    fn value_mut(&mut self) -> Option<&mut V> {
        match self {
            Slot::Occupied(_, v) => Some(v),
            _ => None,
        }
    }
}

/// Probe sequence for one hash value in a table of a given size
#[derive(Clone, Copy)]
struct Probe {
    start: u64,
    step: u64,
    size: u64,
}

impl Probe {
    fn new(hash: u64, size: usize) -> Self {
        let size = size as u64;
        Self {
            start: hash % size,
            step: 1 + hash % (size - 1),
            size,
        }
    }

    #[inline]
    fn slot(&self, i: usize) -> usize {
        ((self.start as u128 + i as u128 * self.step as u128) % self.size as u128) as usize
    }
}

enum Placement {
    /// Key found at this slot
    Existing(usize),
    /// First reusable slot on the probe sequence
    Free(usize),
    /// No free slot anywhere on the sequence
    Exhausted,
}

/// Hash table resolving collisions by double hashing
pub struct OpenAddressingHashTable<K, V, S = RandomState> {
    slots: Vec<Slot<K, V>>,
    /// Live entries
    len: usize,
    /// Tombstones
    deleted: usize,
    load_factor: f32,
    max_load_factor: f32,
    hash_builder: S,
    counters: OpCounters,
}

impl<K, V> OpenAddressingHashTable<K, V, RandomState>
where
    K: Hash + Eq,
{
    /// Create a table with the default configuration (19 slots, load factor 0.75)
    pub fn new() -> Self {
        Self::from_valid_config(HashTableConfig::default(), RandomState::new())
    }

    /// Create a table with at least `size` slots, rounded up to a prime
    pub fn with_table_size(size: usize) -> Self {
        Self::from_valid_config(HashTableConfig::with_initial_size(size), RandomState::new())
    }

    /// Create a table from a validated configuration
    pub fn with_config(config: HashTableConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V, S> OpenAddressingHashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Create a table with the default configuration and a custom hasher
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::from_valid_config(HashTableConfig::default(), hash_builder)
    }

    /// Create a table from a configuration and a custom hasher.
    ///
    /// `max_load_factor` is capped at [`MAX_OCCUPANCY`]; a `load_factor` above
    /// it fails with `InvalidLoadFactor`.
    pub fn with_config_and_hasher(config: HashTableConfig, hash_builder: S) -> Result<Self> {
        config.validate()?;
        check_load_factor(config.load_factor, MAX_OCCUPANCY)?;
        Ok(Self::from_valid_config(config, hash_builder))
    }

    fn from_valid_config(config: HashTableConfig, hash_builder: S) -> Self {
        Self {
            slots: empty_slots(clamped_table_size(config.initial_size)),
            len: 0,
            deleted: 0,
            load_factor: config.load_factor,
            max_load_factor: config.max_load_factor.min(MAX_OCCUPANCY),
            hash_builder,
            counters: OpCounters::new(),
        }
    }

    /// Insert a new entry, reporting duplicates and a full table as outcomes
    pub fn add(&mut self, key: K, value: V) -> AddOutcome {
        match self.insert_entry(key, value) {
            Placement::Free(_) => AddOutcome::Inserted,
            Placement::Existing(_) => AddOutcome::Duplicate,
            Placement::Exhausted => AddOutcome::TableFull,
        }
    }

    /// [`add`](Self::add) mapped onto `AlreadyExists` / `TableFull` errors
    pub fn try_add(&mut self, key: K, value: V) -> Result<()> {
        match self.add(key, value) {
            AddOutcome::Inserted => Ok(()),
            AddOutcome::Duplicate => Err(LexmapError::already_exists()),
            AddOutcome::TableFull => Err(LexmapError::table_full(self.slots.len())),
        }
    }

    /// Tombstone the slot holding `key`; `false` if the key is absent
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(key).is_some()
    }

    /// Tombstone the slot holding `key` and return its value
    pub fn take<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.find(key)?;
        match std::mem::replace(&mut self.slots[index], Slot::Deleted) {
            Slot::Occupied(_, value) => {
                self.len -= 1;
                self.deleted += 1;
                Some(value)
            }
            other => {
                self.slots[index] = other;
                None
            }
        }
    }

    /// Value stored under `key`
    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(key)
            .and_then(|index| self.slots[index].value())
            .ok_or(LexmapError::KeyNotFound)
    }

    /// Alias of [`get`](Self::get)
    pub fn at<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key)
    }

    /// Mutable value stored under `key`
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.find(key).ok_or(LexmapError::KeyNotFound)?;
        self.slots[index].value_mut().ok_or(LexmapError::KeyNotFound)
    }

    /// Value under `key`, inserting `V::default()` first when absent
    pub fn get_or_insert_default(&mut self, key: K) -> Result<&mut V>
    where
        V: Default,
    {
        let index = match self.find(&key) {
            Some(index) => index,
            None => match self.insert_entry(key, V::default()) {
                Placement::Free(index) | Placement::Existing(index) => index,
                Placement::Exhausted => return Err(LexmapError::table_full(self.slots.len())),
            },
        };
        self.slots[index].value_mut().ok_or(LexmapError::KeyNotFound)
    }

    /// Check whether `key` is stored
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(key).is_some()
    }

    /// Set the rehash threshold; must lie in `(0, max_load_factor]`
    ///
    /// Fails with a configuration error, leaving the table untouched, when the
    /// live entries would need more than
    /// [`MAX_TABLE_SIZE`](super::primes::MAX_TABLE_SIZE) slots.
    pub fn set_load_factor(&mut self, load_factor: f32) -> Result<()> {
        check_load_factor(load_factor, self.max_load_factor)?;
        let size = fitted_size(self.slots.len(), self.len, load_factor)?;
        log::debug!(
            "Open-addressing table load factor {} -> {}",
            self.load_factor,
            load_factor
        );
        self.load_factor = load_factor;
        if size != self.slots.len() {
            self.rehash(size);
        }
        Ok(())
    }

    /// Grow the slot array to at least `size` slots (rounded up to a prime)
    pub fn reserve(&mut self, size: usize) -> Result<()> {
        let target = table_size(size)?;
        if target > self.slots.len() {
            self.rehash(target);
        }
        Ok(())
    }

    /// Reset every slot to empty, keeping the current table size
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.len = 0;
        self.deleted = 0;
        log::trace!("Open-addressing table cleared ({} slots)", self.slots.len());
    }

    /// Iterate live entries in slot order
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.len,
        }
    }

    /// Iterate live entries with mutable values, in slot order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.slots.iter_mut().filter_map(|slot| match slot {
            Slot::Occupied(k, v) => Some((&*k, v)),
            _ => None,
        })
    }

    // Internal: store an entry, rebuilding first when the insert would cross
    // the threshold. Returns the slot used, or the slot of the existing key.
    fn insert_entry(&mut self, key: K, value: V) -> Placement {
        let hash = self.hash(&key);
        let mut placement = self.placement(hash, &key);
        let target = match placement {
            Placement::Existing(_) => return placement,
            Placement::Free(index) => Some(index),
            Placement::Exhausted => None,
        };
        if self.rebuild_before_insert(target) {
            placement = self.placement(hash, &key);
        }
        match placement {
            Placement::Free(index) => {
                if self.slots[index].state() == SlotState::Deleted {
                    self.deleted -= 1;
                }
                self.slots[index] = Slot::Occupied(key, value);
                self.len += 1;
            }
            Placement::Exhausted => {
                log::warn!("Open-addressing table full at {} slots", self.slots.len());
            }
            Placement::Existing(_) => {}
        }
        placement
    }

    // Internal: grow when live entries would exceed the threshold, or rebuild
    // in place when tombstones push the occupancy over it
    fn rebuild_before_insert(&mut self, target: Option<usize>) -> bool {
        let size = self.slots.len() as f32;
        let reuses_tombstone =
            target.map_or(false, |index| self.slots[index].state() == SlotState::Deleted);
        let live = self.len + 1;
        let tombstones = self.deleted - usize::from(reuses_tombstone);

        if live as f32 / size > self.load_factor {
            match fitted_size(self.slots.len(), live, self.load_factor) {
                Ok(new_size) => {
                    self.rehash(new_size);
                    return true;
                }
                Err(err) => log::warn!("Open-addressing growth capped: {}", err),
            }
        }
        if tombstones > 0 && (live + tombstones) as f32 / size > self.load_factor {
            self.rehash(self.slots.len());
            true
        } else {
            false
        }
    }

    // Internal: walk the probe sequence for an insert
    fn placement(&self, hash: u64, key: &K) -> Placement {
        let probe = Probe::new(hash, self.slots.len());
        let mut first_free = None;
        for i in 0..self.slots.len() {
            let index = probe.slot(i);
            self.counters.compare();
            match &self.slots[index] {
                Slot::Empty => return Placement::Free(first_free.unwrap_or(index)),
                Slot::Deleted => {
                    first_free.get_or_insert(index);
                }
                Slot::Occupied(k, _) if k == key => return Placement::Existing(index),
                Slot::Occupied(..) => {}
            }
        }
        first_free.map_or(Placement::Exhausted, Placement::Free)
    }

    // Internal: slot index holding `key`
    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let probe = Probe::new(self.hash(key), self.slots.len());
        for i in 0..self.slots.len() {
            let index = probe.slot(i);
            self.counters.compare();
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Deleted => {}
                Slot::Occupied(k, _) if k.borrow() == key => return Some(index),
                Slot::Occupied(..) => {}
            }
        }
        None
    }

    // Internal: rebuild into `new_size` slots, dropping tombstones
    fn rehash(&mut self, new_size: usize) {
        log::debug!(
            "Open-addressing rehash: {} -> {} slots ({} live, {} tombstones)",
            self.slots.len(),
            new_size,
            self.len,
            self.deleted
        );
        let old = std::mem::replace(&mut self.slots, empty_slots(new_size));
        for slot in old {
            if let Slot::Occupied(key, value) = slot {
                let probe = Probe::new(self.hash(&key), new_size);
                let index = (0..new_size)
                    .map(|i| probe.slot(i))
                    .find(|&index| matches!(self.slots[index], Slot::Empty));
                // A prime-sized table with len <= size reaches every slot
                debug_assert!(index.is_some(), "no empty slot for a live entry in rehash");
                if let Some(index) = index {
                    self.slots[index] = Slot::Occupied(key, value);
                }
            }
        }
        self.deleted = 0;
        self.counters.rehash();
    }

    fn hash<Q>(&self, key: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        let mut hasher = self.hash_builder.build_hasher();
        key.hash(&mut hasher);
        hasher.finish()
    }
}

impl<K, V, S> OpenAddressingHashTable<K, V, S> {
    /// Number of live entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots (always prime)
    pub fn table_size(&self) -> usize {
        self.slots.len()
    }

    /// Number of tombstoned slots
    pub fn deleted_count(&self) -> usize {
        self.deleted
    }

    /// State of slot `index`
    pub fn slot_state(&self, index: usize) -> Option<SlotState> {
        self.slots.get(index).map(Slot::state)
    }

    /// Configured rehash threshold
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Upper bound for the rehash threshold
    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Current `elements / table_size`
    pub fn current_load(&self) -> f32 {
        self.len as f32 / self.slots.len() as f32
    }

    /// Slots examined so far across all probe sequences
    pub fn comparisons(&self) -> u64 {
        self.counters.comparisons()
    }

    /// Always 0; hash tables do not rotate
    pub fn rotations(&self) -> u64 {
        0
    }

    /// Rebuilds performed so far (growth and tombstone purges)
    pub fn rehash_count(&self) -> u64 {
        self.counters.rehashes()
    }

    /// Snapshot of all counters
    pub fn stats(&self) -> OpStats {
        self.counters.snapshot()
    }
}

fn empty_slots<K, V>(size: usize) -> Vec<Slot<K, V>> {
    (0..size).map(|_| Slot::Empty).collect()
}

impl<K, V> Default for OpenAddressingHashTable<K, V, RandomState>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> fmt::Debug for OpenAddressingHashTable<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().filter_map(|slot| match slot {
                Slot::Occupied(k, v) => Some((k, v)),
                _ => None,
            }))
            .finish()
    }
}

/// One line per slot: `index: (key, value)`, `index: DELETED` or `index: EMPTY`
impl<K, V, S> fmt::Display for OpenAddressingHashTable<K, V, S>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, slot) in self.slots.iter().enumerate() {
            match slot {
                Slot::Occupied(key, value) => writeln!(f, "{}: ({}, {})", index, key, value)?,
                Slot::Deleted => writeln!(f, "{}: DELETED", index)?,
                Slot::Empty => writeln!(f, "{}: EMPTY", index)?,
            }
        }
        Ok(())
    }
}

/// Iterator over the live entries of an [`OpenAddressingHashTable`] in slot order
pub struct Iter<'a, K, V> {
    slots: std::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Slot::Occupied(key, value) = slot {
                self.remaining -= 1;
                return Some((key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a OpenAddressingHashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
