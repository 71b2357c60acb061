//! Word-frequency counting over any of the four containers
//!
//! [`WordCounter`] is the narrow interface a frequency-counting front end needs:
//! record a key, read a count back, dump everything in key order and read the
//! instrumentation counters. [`ContainerKind`] picks the backing container by
//! name.
//!
//! ```rust
//! use lexmap::counter::{ContainerKind, WordCounter};
//!
//! let mut counter = "rb".parse::<ContainerKind>().unwrap().build::<String>();
//! for word in "to be or not to be".split_whitespace() {
//!     counter.record(word.to_string()).unwrap();
//! }
//! assert_eq!(counter.count(&"to".to_string()), Some(2));
//! assert_eq!(counter.ordered_counts()[0], ("be".to_string(), 2));
//! ```

use crate::config::HashTableConfig;
use crate::error::{LexmapError, Result};
use crate::hash_map::{ChainedHashTable, OpenAddressingHashTable};
use crate::tree::{AvlTree, Comparator, RedBlackTree};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::str::FromStr;

/// Frequency table keyed by `K`
pub trait WordCounter<K> {
    /// Add one occurrence of `key`
    fn record(&mut self, key: K) -> Result<()>;

    /// Occurrences recorded for `key`
    fn count(&self, key: &K) -> Option<usize>;

    /// Number of distinct keys
    fn len(&self) -> usize;

    /// Check if nothing was recorded
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Key comparisons performed by the backing container
    fn comparisons(&self) -> u64;

    /// Rotations performed by the backing container (0 for hash tables)
    fn rotations(&self) -> u64;

    /// All `(key, count)` pairs in ascending key order
    fn ordered_counts(&self) -> Vec<(K, usize)>;

    /// Which container backs this counter
    fn kind(&self) -> ContainerKind;
}

impl<K, C> WordCounter<K> for AvlTree<K, usize, C>
where
    K: Clone,
    C: Comparator<K>,
{
    fn record(&mut self, key: K) -> Result<()> {
        match self.get_mut(&key) {
            Ok(count) => *count += 1,
            Err(LexmapError::KeyNotFound) => {
                self.insert(key, 1);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn count(&self, key: &K) -> Option<usize> {
        self.get(key).ok().copied()
    }

    fn len(&self) -> usize {
        AvlTree::len(self)
    }

    fn comparisons(&self) -> u64 {
        AvlTree::comparisons(self)
    }

    fn rotations(&self) -> u64 {
        AvlTree::rotations(self)
    }

    fn ordered_counts(&self) -> Vec<(K, usize)> {
        self.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    fn kind(&self) -> ContainerKind {
        ContainerKind::Avl
    }
}

impl<K, C> WordCounter<K> for RedBlackTree<K, usize, C>
where
    K: Clone,
    C: Comparator<K>,
{
    fn record(&mut self, key: K) -> Result<()> {
        match self.get_mut(&key) {
            Ok(count) => {
                *count += 1;
                Ok(())
            }
            Err(LexmapError::KeyNotFound) => self.insert(key, 1),
            Err(e) => Err(e),
        }
    }

    fn count(&self, key: &K) -> Option<usize> {
        self.search(key).ok().copied()
    }

    fn len(&self) -> usize {
        RedBlackTree::len(self)
    }

    fn comparisons(&self) -> u64 {
        RedBlackTree::comparisons(self)
    }

    fn rotations(&self) -> u64 {
        RedBlackTree::rotations(self)
    }

    fn ordered_counts(&self) -> Vec<(K, usize)> {
        self.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    fn kind(&self) -> ContainerKind {
        ContainerKind::RedBlack
    }
}

impl<K, S> WordCounter<K> for ChainedHashTable<K, usize, S>
where
    K: Hash + Eq + Ord + Clone,
    S: BuildHasher,
{
    fn record(&mut self, key: K) -> Result<()> {
        match self.get_mut(&key) {
            Ok(count) => {
                *count += 1;
                Ok(())
            }
            Err(LexmapError::KeyNotFound) => self.add(key, 1),
            Err(e) => Err(e),
        }
    }

    fn count(&self, key: &K) -> Option<usize> {
        self.get(key).ok().copied()
    }

    fn len(&self) -> usize {
        ChainedHashTable::len(self)
    }

    fn comparisons(&self) -> u64 {
        ChainedHashTable::comparisons(self)
    }

    fn rotations(&self) -> u64 {
        ChainedHashTable::rotations(self)
    }

    fn ordered_counts(&self) -> Vec<(K, usize)> {
        sorted_dump(self.iter())
    }

    fn kind(&self) -> ContainerKind {
        ContainerKind::Chained
    }
}

impl<K, S> WordCounter<K> for OpenAddressingHashTable<K, usize, S>
where
    K: Hash + Eq + Ord + Clone,
    S: BuildHasher,
{
    fn record(&mut self, key: K) -> Result<()> {
        match self.get_mut(&key) {
            Ok(count) => {
                *count += 1;
                Ok(())
            }
            Err(LexmapError::KeyNotFound) => self.try_add(key, 1),
            Err(e) => Err(e),
        }
    }

    fn count(&self, key: &K) -> Option<usize> {
        self.get(key).ok().copied()
    }

    fn len(&self) -> usize {
        OpenAddressingHashTable::len(self)
    }

    fn comparisons(&self) -> u64 {
        OpenAddressingHashTable::comparisons(self)
    }

    fn rotations(&self) -> u64 {
        OpenAddressingHashTable::rotations(self)
    }

    fn ordered_counts(&self) -> Vec<(K, usize)> {
        sorted_dump(self.iter())
    }

    fn kind(&self) -> ContainerKind {
        ContainerKind::OpenAddressing
    }
}

fn sorted_dump<'a, K, I>(entries: I) -> Vec<(K, usize)>
where
    K: Ord + Clone + 'a,
    I: Iterator<Item = (&'a K, &'a usize)>,
{
    let mut dump: Vec<(K, usize)> = entries.map(|(k, v)| (k.clone(), *v)).collect();
    dump.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    dump
}

/// The four interchangeable containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// [`AvlTree`]
    Avl,
    /// [`RedBlackTree`]
    RedBlack,
    /// [`ChainedHashTable`]
    Chained,
    /// [`OpenAddressingHashTable`]
    OpenAddressing,
}

impl ContainerKind {
    /// Every kind, trees first
    pub const ALL: [ContainerKind; 4] = [
        ContainerKind::Avl,
        ContainerKind::RedBlack,
        ContainerKind::Chained,
        ContainerKind::OpenAddressing,
    ];

    /// Short name, as accepted by `FromStr`
    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::Avl => "avl",
            ContainerKind::RedBlack => "rb",
            ContainerKind::Chained => "chained",
            ContainerKind::OpenAddressing => "open",
        }
    }

    /// Whether the container keeps its keys ordered
    pub fn is_ordered(self) -> bool {
        matches!(self, ContainerKind::Avl | ContainerKind::RedBlack)
    }

    /// Empty counter backed by this kind, hash tables with default sizing
    pub fn build<K>(self) -> Box<dyn WordCounter<K>>
    where
        K: Ord + Hash + Clone + 'static,
    {
        match self {
            ContainerKind::Avl => Box::new(AvlTree::<K, usize>::new()),
            ContainerKind::RedBlack => Box::new(RedBlackTree::<K, usize>::new()),
            ContainerKind::Chained => Box::new(ChainedHashTable::<K, usize>::new()),
            ContainerKind::OpenAddressing => Box::new(OpenAddressingHashTable::<K, usize>::new()),
        }
    }

    /// Empty counter backed by this kind; hash tables use `config`
    pub fn build_with_config<K>(self, config: &HashTableConfig) -> Result<Box<dyn WordCounter<K>>>
    where
        K: Ord + Hash + Clone + 'static,
    {
        Ok(match self {
            ContainerKind::Avl | ContainerKind::RedBlack => self.build(),
            ContainerKind::Chained => {
                Box::new(ChainedHashTable::<K, usize>::with_config(config.clone())?)
            }
            ContainerKind::OpenAddressing => {
                Box::new(OpenAddressingHashTable::<K, usize>::with_config(config.clone())?)
            }
        })
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContainerKind {
    type Err = LexmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avl" | "avl-tree" | "avl_tree" => Ok(ContainerKind::Avl),
            "rb" | "rbt" | "red-black" | "red_black" | "redblack" => Ok(ContainerKind::RedBlack),
            "chained" | "chain" | "chained-hash" | "chained_hash" => Ok(ContainerKind::Chained),
            "open" | "oa" | "open-addressing" | "open_addressing" => {
                Ok(ContainerKind::OpenAddressing)
            }
            other => Err(LexmapError::configuration(format!(
                "unknown container kind '{}' (expected avl, rb, chained or open)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "the cat and the dog and the bird";

    fn fill(kind: ContainerKind) -> Box<dyn WordCounter<String>> {
        let mut counter = kind.build::<String>();
        for word in TEXT.split_whitespace() {
            counter.record(word.to_string()).unwrap();
        }
        counter
    }

    #[test]
    fn test_every_kind_counts_the_same() {
        let expected = vec![
            ("and".to_string(), 2),
            ("bird".to_string(), 1),
            ("cat".to_string(), 1),
            ("dog".to_string(), 1),
            ("the".to_string(), 3),
        ];
        for kind in ContainerKind::ALL {
            let counter = fill(kind);
            assert_eq!(counter.kind(), kind);
            assert_eq!(counter.len(), 5, "{}", kind);
            assert_eq!(counter.ordered_counts(), expected, "{}", kind);
            assert_eq!(counter.count(&"the".to_string()), Some(3));
            assert_eq!(counter.count(&"fish".to_string()), None);
            assert!(counter.comparisons() > 0, "{}", kind);
        }
    }

    #[test]
    fn test_hash_tables_never_rotate() {
        for kind in ContainerKind::ALL {
            let counter = fill(kind);
            assert_eq!(counter.rotations() > 0, kind.is_ordered(), "{}", kind);
        }
    }

    #[test]
    fn test_kind_names_roundtrip() {
        for kind in ContainerKind::ALL {
            assert_eq!(kind.to_string().parse::<ContainerKind>().unwrap(), kind);
        }
        assert_eq!("Red-Black".parse::<ContainerKind>().unwrap(), ContainerKind::RedBlack);
        assert_eq!(" OA ".parse::<ContainerKind>().unwrap(), ContainerKind::OpenAddressing);
        assert!(matches!(
            "splay".parse::<ContainerKind>(),
            Err(LexmapError::Configuration { .. })
        ));
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&ContainerKind::OpenAddressing).unwrap();
        assert_eq!(json, "\"open_addressing\"");
        let parsed: ContainerKind = serde_json::from_str("\"red_black\"").unwrap();
        assert_eq!(parsed, ContainerKind::RedBlack);
    }

    #[test]
    fn test_build_with_config() {
        let config = HashTableConfig::with_initial_size(3).load_factor(0.5);
        for kind in ContainerKind::ALL {
            let mut counter = kind.build_with_config::<u32>(&config).unwrap();
            for i in 0..100 {
                counter.record(i % 10).unwrap();
            }
            assert_eq!(counter.len(), 10);
            assert_eq!(counter.count(&7), Some(10));
        }

        let bad = HashTableConfig::default().load_factor(2.0);
        assert!(ContainerKind::Chained.build_with_config::<u32>(&bad).is_err());
        assert!(ContainerKind::Avl.build_with_config::<u32>(&bad).is_ok());
    }

    #[test]
    fn test_overfull_load_factor_only_suits_chaining() {
        let config = HashTableConfig {
            initial_size: 3,
            load_factor: 2.0,
            max_load_factor: 2.0,
        };
        let mut chained = ContainerKind::Chained.build_with_config::<u32>(&config).unwrap();
        for i in 0..100 {
            chained.record(i).unwrap();
        }
        assert_eq!(chained.len(), 100);

        assert!(matches!(
            ContainerKind::OpenAddressing.build_with_config::<u32>(&config),
            Err(LexmapError::InvalidLoadFactor { .. })
        ));
    }
}
