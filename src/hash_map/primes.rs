//! Prime table sizing shared by both hash tables

use crate::error::{LexmapError, Result};

/// Smallest table size handed out; keeps `size - 1` non-zero for double hashing
pub const MIN_TABLE_SIZE: usize = 3;

/// Largest table size either table grows to (the largest prime below 2^28)
pub const MAX_TABLE_SIZE: usize = 268_435_399;

/// Trial-division primality test
pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut divisor = 3;
    while divisor <= n / divisor {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

/// Smallest prime `>= n`, never below [`MIN_TABLE_SIZE`].
///
/// Returns `None` when no such prime fits in a `usize`.
pub fn next_prime(n: usize) -> Option<usize> {
    if n <= MIN_TABLE_SIZE {
        return Some(MIN_TABLE_SIZE);
    }
    let mut candidate = n | 1;
    while !is_prime(candidate) {
        candidate = candidate.checked_add(2)?;
    }
    Some(candidate)
}

/// Size a table grows to on rehash: next prime `>= 2 * current`
#[inline]
pub fn grown_size(current: usize) -> Option<usize> {
    next_prime(current.checked_mul(2)?)
}

/// Prime table size for a request of `requested` slots.
///
/// Fails with a configuration error above [`MAX_TABLE_SIZE`].
pub fn table_size(requested: usize) -> Result<usize> {
    next_prime(requested)
        .filter(|&size| size <= MAX_TABLE_SIZE)
        .ok_or_else(|| {
            LexmapError::configuration(format!(
                "requested table size {} exceeds the maximum of {}",
                requested, MAX_TABLE_SIZE
            ))
        })
}

/// Prime table size for `requested` slots, clamped to [`MAX_TABLE_SIZE`]
pub(crate) fn clamped_table_size(requested: usize) -> usize {
    next_prime(requested.min(MAX_TABLE_SIZE)).unwrap_or(MAX_TABLE_SIZE)
}

/// Grow `current` by repeated doubling until `elements` fit under
/// `load_factor`. Returns `current` unchanged when they already fit.
pub fn fitted_size(current: usize, elements: usize, load_factor: f32) -> Result<usize> {
    let mut size = current;
    while elements as f32 / size as f32 > load_factor {
        size = grown_size(size)
            .filter(|&size| size <= MAX_TABLE_SIZE)
            .ok_or_else(|| {
                LexmapError::configuration(format!(
                    "{} entries at load factor {} need more than {} slots",
                    elements, load_factor, MAX_TABLE_SIZE
                ))
            })?;
    }
    Ok(size)
}
