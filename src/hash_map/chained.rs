//! ChainedHashTable - separate chaining over a prime-sized bucket array
//!
//! Each bucket is a `Vec` of entries kept in insertion order. The bucket for a
//! key is `hash(key) mod table_size`; the table size is always prime. Once
//! `elements / table_size` exceeds the configured load factor the table grows
//! to the next prime at least twice its size and every entry is redistributed.
//!
//! # Examples
//!
//! ```rust
//! use lexmap::hash_map::ChainedHashTable;
//!
//! let mut table = ChainedHashTable::new();
//! table.add("hello".to_string(), 1).unwrap();
//! assert_eq!(table.get("hello").unwrap(), &1);
//! assert!(table.add("hello".to_string(), 2).is_err());
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

/// Hash table resolving collisions by chaining
pub struct ChainedHashTable<K, V, S = RandomState> {
    /// Bucket array; its length is the table size
    buckets: Vec<Vec<(K, V)>>,
    /// Number of stored entries
    len: usize,
    /// Rehash threshold
    load_factor: f32,
    /// Upper bound accepted by `set_load_factor`
    max_load_factor: f32,
    hash_builder: S,
    counters: OpCounters,
}

impl<K, V> ChainedHashTable<K, V, RandomState>
where
    K: Hash + Eq,
{
    /// Create a table with the default configuration (19 buckets, load factor 0.75)
    pub fn new() -> Self {
        Self::from_valid_config(HashTableConfig::default(), RandomState::new())
    }

    /// Create a table with at least `size` buckets, rounded up to a prime
    pub fn with_table_size(size: usize) -> Self {
        Self::from_valid_config(HashTableConfig::with_initial_size(size), RandomState::new())
    }

    /// Create a table from a validated configuration
    pub fn with_config(config: HashTableConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V, S> ChainedHashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Create a table with the default configuration and a custom hasher
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::from_valid_config(HashTableConfig::default(), hash_builder)
    }

    /// Create a table from a configuration and a custom hasher
    pub fn with_config_and_hasher(config: HashTableConfig, hash_builder: S) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config, hash_builder))
    }

    fn from_valid_config(config: HashTableConfig, hash_builder: S) -> Self {
        let size = clamped_table_size(config.initial_size);
        Self {
            buckets: (0..size).map(|_| Vec::new()).collect(),
            len: 0,
            load_factor: config.load_factor,
            max_load_factor: config.max_load_factor,
            hash_builder,
            counters: OpCounters::new(),
        }
    }

    /// Insert a new entry; fails with `AlreadyExists` if the key is present
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        if self.find(&key).is_some() {
            return Err(LexmapError::already_exists());
        }
        self.push_new(key, value);
        Ok(())
    }

    /// Remove `key`, reporting `KeyNotFound` whether or not an entry was erased.
    ///
    /// The first matching entry in the key's bucket is erased and the call then
    /// fails unconditionally. Callers that need to know whether anything was
    /// removed should use [`take`](Self::take).
    pub fn remove<Q>(&mut self, key: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if let Some((bucket, pos)) = self.find(key) {
            self.buckets[bucket].remove(pos);
            self.len -= 1;
        }
        Err(LexmapError::key_not_found())
    }

    /// Remove `key` and return its value; `KeyNotFound` only when absent
    pub fn take<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (bucket, pos) = self.find(key).ok_or(LexmapError::KeyNotFound)?;
        let (_, value) = self.buckets[bucket].remove(pos);
        self.len -= 1;
        Ok(value)
    }

    /// Value stored under `key`
    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (bucket, pos) = self.find(key).ok_or(LexmapError::KeyNotFound)?;
        Ok(&self.buckets[bucket][pos].1)
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
        let (bucket, pos) = self.find(key).ok_or(LexmapError::KeyNotFound)?;
        Ok(&mut self.buckets[bucket][pos].1)
    }

    /// Value under `key`, inserting `V::default()` first when absent
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let (bucket, pos) = match self.find(&key) {
            Some(found) => found,
            None => self.push_new(key, V::default()),
        };
        &mut self.buckets[bucket][pos].1
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
    /// current entries would need more than
    /// [`MAX_TABLE_SIZE`](super::primes::MAX_TABLE_SIZE) buckets.
    pub fn set_load_factor(&mut self, load_factor: f32) -> Result<()> {
        check_load_factor(load_factor, self.max_load_factor)?;
        let size = fitted_size(self.buckets.len(), self.len, load_factor)?;
        log::debug!(
            "Chained table load factor {} -> {}",
            self.load_factor,
            load_factor
        );
        self.load_factor = load_factor;
        if size != self.buckets.len() {
            self.rehash(size);
        }
        Ok(())
    }

    /// Grow the bucket array to at least `size` buckets (rounded up to a prime)
    pub fn reserve(&mut self, size: usize) -> Result<()> {
        let target = table_size(size)?;
        if target > self.buckets.len() {
            self.rehash(target);
        }
        Ok(())
    }

    /// Remove every entry, keeping the current table size
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
        log::trace!("Chained table cleared ({} buckets)", self.buckets.len());
    }

    /// Iterate entries in bucket order, insertion order within a bucket
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: &self.buckets,
            bucket: 0,
            entry: 0,
            remaining: self.len,
        }
    }

    /// Iterate entries with mutable values, in the same order as [`iter`](Self::iter)
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.buckets
            .iter_mut()
            .flat_map(|bucket| bucket.iter_mut().map(|(k, v)| (&*k, v)))
    }

    // Internal: locate `key` as (bucket, position)
    fn find<Q>(&self, key: &Q) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let bucket = self.bucket_index(key);
        let pos = self.buckets[bucket].iter().position(|(k, _)| {
            self.counters.compare();
            k.borrow() == key
        })?;
        Some((bucket, pos))
    }

    // Internal: append an entry known to be absent, growing first if the new
    // element count would cross the threshold
    fn push_new(&mut self, key: K, value: V) -> (usize, usize) {
        self.grow_to_fit(self.len + 1);
        let bucket = self.bucket_index(&key);
        self.buckets[bucket].push((key, value));
        self.len += 1;
        (bucket, self.buckets[bucket].len() - 1)
    }

    // Internal: double until `elements` fits under the load factor. At the
    // size ceiling chains just get longer.
    fn grow_to_fit(&mut self, elements: usize) {
        match fitted_size(self.buckets.len(), elements, self.load_factor) {
            Ok(size) if size != self.buckets.len() => self.rehash(size),
            Ok(_) => {}
            Err(err) => log::warn!("Chained table growth capped: {}", err),
        }
    }

    // Internal: redistribute every entry over `new_size` buckets
    fn rehash(&mut self, new_size: usize) {
        log::debug!(
            "Chained table rehash: {} -> {} buckets ({} entries)",
            self.buckets.len(),
            new_size,
            self.len
        );
        let old = std::mem::replace(
            &mut self.buckets,
            (0..new_size).map(|_| Vec::new()).collect(),
        );
        for (key, value) in old.into_iter().flatten() {
            let bucket = self.bucket_index(&key);
            self.buckets[bucket].push((key, value));
        }
        self.counters.rehash();
    }

    // Internal: bucket index for a key
    fn bucket_index<Q>(&self, key: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        let mut hasher = self.hash_builder.build_hasher();
        key.hash(&mut hasher);
        (hasher.finish() % self.buckets.len() as u64) as usize
    }
}

impl<K, V, S> ChainedHashTable<K, V, S> {
    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets (always prime)
    pub fn table_size(&self) -> usize {
        self.buckets.len()
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
        self.len as f32 / self.buckets.len() as f32
    }

    /// Number of entries in bucket `index`
    pub fn bucket_len(&self, index: usize) -> Option<usize> {
        self.buckets.get(index).map(Vec::len)
    }

    /// Key comparisons performed so far
    pub fn comparisons(&self) -> u64 {
        self.counters.comparisons()
    }

    /// Always 0; hash tables do not rotate
    pub fn rotations(&self) -> u64 {
        0
    }

    /// Rehashes performed so far
    pub fn rehash_count(&self) -> u64 {
        self.counters.rehashes()
    }

    /// Snapshot of all counters
    pub fn stats(&self) -> OpStats {
        self.counters.snapshot()
    }
}

impl<K, V> Default for ChainedHashTable<K, V, RandomState>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> fmt::Debug for ChainedHashTable<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.buckets.iter().flatten().map(|(k, v)| (k, v)))
            .finish()
    }
}

/// One line per bucket: `index: (key, value) (key, value) `
impl<K, V, S> fmt::Display for ChainedHashTable<K, V, S>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, bucket) in self.buckets.iter().enumerate() {
            write!(f, "{}: ", index)?;
            for (key, value) in bucket {
                write!(f, "({}, {}) ", key, value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Iterator over a [`ChainedHashTable`] in bucket order
///
/// Borrows the table, so it cannot outlive a structural change.
pub struct Iter<'a, K, V> {
    buckets: &'a [Vec<(K, V)>],
    bucket: usize,
    entry: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.bucket < self.buckets.len() {
            if let Some((key, value)) = self.buckets[self.bucket].get(self.entry) {
                self.entry += 1;
                self.remaining -= 1;
                return Some((key, value));
            }
            self.bucket += 1;
            self.entry = 0;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashTable<K, V, S>
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_map::primes::is_prime;
    use crate::hash_map::test_support::IdentityState;

    fn identity_table(size: usize) -> ChainedHashTable<u64, &'static str, IdentityState> {
        ChainedHashTable::with_config_and_hasher(
            HashTableConfig::with_initial_size(size),
            IdentityState::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_basic_add_get() {
        let mut table = ChainedHashTable::<String, i32>::new();
        table.add("hello".to_string(), 42).unwrap();
        assert_eq!(table.get("hello").unwrap(), &42);
        assert_eq!(table.at("hello").unwrap(), &42);
        assert_eq!(table.len(), 1);
        assert!(table.contains("hello"));
        assert!(!table.contains("world"));
    }

    #[test]
    fn test_default_sizing() {
        let table = ChainedHashTable::<i32, i32>::new();
        assert_eq!(table.table_size(), 19);
        assert_eq!(table.load_factor(), 0.75);
        assert_eq!(table.max_load_factor(), 1.0);

        let table = ChainedHashTable::<i32, i32>::with_table_size(20);
        assert_eq!(table.table_size(), 23);
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let mut table = ChainedHashTable::<String, i32>::new();
        table.add("key".to_string(), 1).unwrap();
        let err = table.add("key".to_string(), 2).unwrap_err();
        assert!(matches!(err, LexmapError::AlreadyExists));
        assert_eq!(table.get("key").unwrap(), &1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_always_reports_not_found() {
        let mut table = ChainedHashTable::<i32, i32>::new();
        table.add(1, 10).unwrap();
        table.add(2, 20).unwrap();

        // The entry is erased and the call still reports KeyNotFound
        assert!(matches!(table.remove(&1), Err(LexmapError::KeyNotFound)));
        assert!(!table.contains(&1));
        assert_eq!(table.len(), 1);

        assert!(matches!(table.remove(&99), Err(LexmapError::KeyNotFound)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_take() {
        let mut table = ChainedHashTable::<i32, String>::new();
        table.add(7, "seven".to_string()).unwrap();
        assert_eq!(table.take(&7).unwrap(), "seven");
        assert!(table.is_empty());
        assert!(matches!(table.take(&7), Err(LexmapError::KeyNotFound)));
    }

    #[test]
    fn test_missing_key_lookup() {
        let mut table = ChainedHashTable::<i32, i32>::new();
        assert!(matches!(table.get(&5), Err(LexmapError::KeyNotFound)));
        assert!(matches!(table.get_mut(&5), Err(LexmapError::KeyNotFound)));
    }

    #[test]
    fn test_single_rehash_at_threshold() {
        let config = HashTableConfig::with_initial_size(19).load_factor(0.75);
        let mut table = ChainedHashTable::<u32, u32>::with_config(config).unwrap();

        for i in 0..14 {
            table.add(i, i).unwrap();
        }
        assert_eq!(table.rehash_count(), 0);
        assert_eq!(table.table_size(), 19);

        // 15 / 19 > 0.75
        table.add(14, 14).unwrap();
        assert_eq!(table.rehash_count(), 1);
        assert_eq!(table.table_size(), 41);

        for i in 0..15 {
            assert_eq!(table.get(&i).unwrap(), &i);
        }
    }

    #[test]
    fn test_rehash_keeps_every_key() {
        let mut table = ChainedHashTable::<u32, u32>::new();
        for i in 0..2_000 {
            table.add(i, i * 2).unwrap();
            assert!(is_prime(table.table_size()));
        }
        assert!(table.rehash_count() > 0);
        assert!(table.current_load() <= table.load_factor());
        for i in 0..2_000 {
            assert_eq!(table.get(&i).unwrap(), &(i * 2));
        }
    }

    #[test]
    fn test_set_load_factor() {
        let mut table = ChainedHashTable::<u32, u32>::new();
        for i in 0..10 {
            table.add(i, i).unwrap();
        }

        assert!(matches!(
            table.set_load_factor(0.0),
            Err(LexmapError::InvalidLoadFactor { .. })
        ));
        assert!(matches!(
            table.set_load_factor(1.5),
            Err(LexmapError::InvalidLoadFactor { .. })
        ));
        assert_eq!(table.load_factor(), 0.75);
        assert_eq!(table.table_size(), 19);

        // 10 / 19 > 0.25 forces growth
        table.set_load_factor(0.25).unwrap();
        assert!(table.current_load() <= 0.25);
        for i in 0..10 {
            assert!(table.contains(&i));
        }
    }

    #[test]
    fn test_reserve() {
        let mut table = ChainedHashTable::<u32, u32>::new();
        table.add(1, 1).unwrap();
        table.reserve(100).unwrap();
        assert_eq!(table.table_size(), 101);
        assert!(table.contains(&1));

        // Never shrinks
        table.reserve(10).unwrap();
        assert_eq!(table.table_size(), 101);

        assert!(matches!(
            table.reserve(usize::MAX),
            Err(LexmapError::Configuration { .. })
        ));
        assert_eq!(table.table_size(), 101);
    }

    #[test]
    fn test_tiny_load_factor_rejected_without_resizing() {
        let mut table = ChainedHashTable::<u32, u32>::new();
        table.add(1, 1).unwrap();

        for factor in [1e-20, 1e-9] {
            assert!(matches!(
                table.set_load_factor(factor),
                Err(LexmapError::Configuration { .. })
            ));
            assert_eq!(table.load_factor(), 0.75);
            assert_eq!(table.table_size(), 19);
            assert_eq!(table.rehash_count(), 0);
        }
        assert_eq!(table.get(&1).unwrap(), &1);

        // Small but satisfiable factors still grow the table
        table.set_load_factor(0.01).unwrap();
        assert!(table.table_size() >= 100);
        assert!(table.current_load() <= 0.01);
    }

    #[test]
    fn test_bucket_insertion_order() {
        let mut table = identity_table(7);
        // 3, 10 and 17 all land in bucket 3
        table.add(10, "ten").unwrap();
        table.add(3, "three").unwrap();
        table.add(17, "seventeen").unwrap();
        table.add(1, "one").unwrap();

        assert_eq!(table.bucket_len(3), Some(3));
        let order: Vec<u64> = table.iter().map(|(k, _)| *k).collect();
        assert_eq!(order, vec![1, 10, 3, 17]);

        table.take(&3).unwrap();
        let order: Vec<u64> = table.iter().map(|(k, _)| *k).collect();
        assert_eq!(order, vec![1, 10, 17]);
    }

    #[test]
    fn test_get_or_insert_default() {
        let mut table = ChainedHashTable::<String, usize>::new();
        for word in ["a", "b", "a", "c", "a"] {
            *table.get_or_insert_default(word.to_string()) += 1;
        }
        assert_eq!(table.get("a").unwrap(), &3);
        assert_eq!(table.get("b").unwrap(), &1);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_get_or_insert_default_across_rehash() {
        let config = HashTableConfig::with_initial_size(3);
        let mut table = ChainedHashTable::<u32, u32>::with_config(config).unwrap();
        for i in 0..50 {
            *table.get_or_insert_default(i) += i;
        }
        assert!(table.rehash_count() > 0);
        for i in 0..50 {
            assert_eq!(table.get(&i).unwrap(), &i);
        }
    }

    #[test]
    fn test_iteration_and_iter_mut() {
        let mut table = ChainedHashTable::<u32, u32>::new();
        for i in 0..30 {
            table.add(i, i).unwrap();
        }
        assert_eq!(table.iter().len(), 30);

        for (_, value) in table.iter_mut() {
            *value *= 10;
        }
        let mut items: Vec<_> = table.iter().map(|(k, v)| (*k, *v)).collect();
        items.sort();
        assert_eq!(items, (0..30).map(|i| (i, i * 10)).collect::<Vec<_>>());
    }

    #[test]
    fn test_clear() {
        let mut table = ChainedHashTable::<u32, u32>::new();
        for i in 0..20 {
            table.add(i, i).unwrap();
        }
        let size = table.table_size();
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.table_size(), size);
        assert_eq!(table.iter().count(), 0);
        table.add(3, 3).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_counters() {
        let mut table = identity_table(7);
        table.add(3, "a").unwrap();
        table.add(10, "b").unwrap();
        let before = table.comparisons();
        assert!(table.contains(&10));
        assert_eq!(table.comparisons() - before, 2);
        assert_eq!(table.rotations(), 0);
        assert_eq!(table.stats().comparisons, table.comparisons());
    }

    #[test]
    fn test_display() {
        let mut table = identity_table(3);
        table.add(1, "one").unwrap();
        table.add(4, "four").unwrap();
        let shown = table.to_string();
        assert_eq!(shown, "0: \n1: (1, one) (4, four) \n2: \n");
    }

    #[test]
    fn test_invalid_config() {
        let config = HashTableConfig::default().load_factor(-1.0);
        assert!(ChainedHashTable::<i32, i32>::with_config(config).is_err());
    }
}
