//! Instrumented hash tables
//!
//! Two collision strategies over a prime-sized table:
//! - `ChainedHashTable`: separate chaining, one entry list per bucket
//! - `OpenAddressingHashTable`: double hashing with tombstones
//!
//! Both grow to the next prime at least twice their size once
//! `elements / table_size` exceeds the configured load factor, and both count
//! key comparisons and rehashes.

mod chained;
mod open_addressing;
pub mod primes;

pub use chained::{ChainedHashTable, Iter as ChainedIter};
pub use open_addressing::{
    AddOutcome, Iter as OpenAddressingIter, OpenAddressingHashTable, SlotState, MAX_OCCUPANCY,
};
pub use primes::{grown_size, is_prime, next_prime, MAX_TABLE_SIZE};
