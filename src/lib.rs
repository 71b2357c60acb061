//! # Lexmap: Instrumented Associative Containers
//!
//! Four interchangeable key-value containers built for comparing balancing and
//! hashing strategies on a word-frequency workload. Every container counts the
//! work it does (key comparisons, rotations, rehashes) so the strategies can be
//! measured against each other.
//!
//! ## Containers
//!
//! - **`AvlTree`**: height-balanced ordered map; duplicate inserts are ignored
//! - **`RedBlackTree`**: color-balanced ordered map with a shared sentinel
//! - **`ChainedHashTable`**: separate chaining over a prime-sized bucket array
//! - **`OpenAddressingHashTable`**: double hashing with tombstones
//!
//! The [`WordCounter`] trait drives any of them uniformly, and
//! [`ContainerKind`] selects one by name.
//!
//! ## Quick Start
//!
//! ```rust
//! use lexmap::{
//!     AvlTree, RedBlackTree, ChainedHashTable, OpenAddressingHashTable,
//!     AddOutcome, ContainerKind, WordCounter,
//! };
//!
//! // Ordered maps
//! let mut avl = AvlTree::new();
//! avl.insert("apple", 3);
//! assert!(!avl.insert("apple", 4));
//!
//! let mut rb = RedBlackTree::new();
//! rb.insert("apple", 3).unwrap();
//! assert_eq!(rb.search(&"apple").unwrap(), &3);
//!
//! // Hash tables
//! let mut chained = ChainedHashTable::new();
//! chained.add("apple", 3).unwrap();
//!
//! let mut open = OpenAddressingHashTable::new();
//! assert_eq!(open.add("apple", 3), AddOutcome::Inserted);
//!
//! // Uniform word counting
//! let mut counter = ContainerKind::Chained.build::<String>();
//! counter.record("apple".to_string()).unwrap();
//! assert_eq!(counter.count(&"apple".to_string()), Some(1));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod counter;
pub mod error;
pub mod hash_map;
pub mod statistics;
pub mod tree;

// Re-export core types
pub use error::{LexmapError, Result};

pub use config::{Config, HashTableConfig};
pub use counter::{ContainerKind, WordCounter};
pub use hash_map::{AddOutcome, ChainedHashTable, OpenAddressingHashTable, SlotState};
pub use statistics::{OpCounters, OpStats};
pub use tree::{AvlTree, Comparator, Direction, NaturalOrder, RedBlackTree, ReverseOrder};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library (currently only logs the version)
pub fn init() {
    log::debug!("Initializing lexmap v{}", VERSION);
}
