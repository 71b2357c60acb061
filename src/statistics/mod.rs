//! Instrumentation counters shared by all containers
//!
//! Lookups such as `get` and `contains` take `&self` but still count key
//! comparisons, so the counters live in [`Cell`]s owned by the container. They
//! are a side channel: nothing in a container's behaviour depends on them.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;

/// Live counters owned by a container
#[derive(Debug, Clone, Default)]
pub struct OpCounters {
    comparisons: Cell<u64>,
    rotations: Cell<u64>,
    rehashes: Cell<u64>,
}

impl OpCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one key comparison
    #[inline]
    pub fn compare(&self) {
        self.comparisons.set(self.comparisons.get() + 1);
    }

    /// Count `n` key comparisons at once
    #[inline]
    pub fn compare_n(&self, n: u64) {
        self.comparisons.set(self.comparisons.get() + n);
    }

    /// Count one tree rotation
    #[inline]
    pub fn rotate(&self) {
        self.rotations.set(self.rotations.get() + 1);
    }

    /// Count one table rebuild
    #[inline]
    pub fn rehash(&self) {
        self.rehashes.set(self.rehashes.get() + 1);
    }

    /// Key comparisons performed so far
    pub fn comparisons(&self) -> u64 {
        self.comparisons.get()
    }

    /// Rotations performed so far
    pub fn rotations(&self) -> u64 {
        self.rotations.get()
    }

    /// Table rebuilds performed so far
    pub fn rehashes(&self) -> u64 {
        self.rehashes.get()
    }

    /// Copy the current values out
    pub fn snapshot(&self) -> OpStats {
        OpStats {
            comparisons: self.comparisons(),
            rotations: self.rotations(),
            rehashes: self.rehashes(),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.comparisons.set(0);
        self.rotations.set(0);
        self.rehashes.set(0);
    }
}

/// Point-in-time copy of a container's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpStats {
    /// Key comparisons (trees) or key/slot checks (hash tables)
    pub comparisons: u64,
    /// Rotations; always 0 for hash tables
    pub rotations: u64,
    /// Table rebuilds; always 0 for trees
    pub rehashes: u64,
}

impl OpStats {
    /// Difference between two snapshots taken from the same container
    pub fn since(&self, earlier: &OpStats) -> OpStats {
        OpStats {
            comparisons: self.comparisons.saturating_sub(earlier.comparisons),
            rotations: self.rotations.saturating_sub(earlier.rotations),
            rehashes: self.rehashes.saturating_sub(earlier.rehashes),
        }
    }
}

impl fmt::Display for OpStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "comparisons={} rotations={} rehashes={}",
            self.comparisons, self.rotations, self.rehashes
        )
    }
}
