//! Error handling for the lexmap library
//!
//! Every container reports failures through [`LexmapError`]. Conditions are local
//! to the operation that raised them: a failed call leaves the container exactly
//! as it was before the call (a `TableFull` report leaves the table at maximum
//! occupancy but consistent).

use thiserror::Error;

/// Main error type for the lexmap library
#[derive(Error, Debug)]
pub enum LexmapError {
    /// I/O related errors (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Insert of a key that is already present
    #[error("Key already exists in the container")]
    AlreadyExists,

    /// Lookup or removal of an absent key
    #[error("Key not found in the container")]
    KeyNotFound,

    /// Load factor outside of `(0, max]`
    #[error("Invalid load factor: {value} (must be in (0, {max}])")]
    InvalidLoadFactor {
        /// The rejected load factor
        value: f32,
        /// The maximum accepted load factor
        max: f32,
    },

    /// Open-addressing probe cycle exhausted without a free slot
    #[error("Table full: no free slot among {capacity} slots")]
    TableFull {
        /// Number of slots in the table
        capacity: usize,
    },

    /// Configuration or parameter errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },

    /// A structural invariant does not hold
    #[error("Corrupted structure: {message}")]
    Corrupted {
        /// Description of the violated invariant
        message: String,
    },
}

impl LexmapError {
    /// Create an already-exists error
    pub fn already_exists() -> Self {
        Self::AlreadyExists
    }

    /// Create a key-not-found error
    pub fn key_not_found() -> Self {
        Self::KeyNotFound
    }

    /// Create an invalid load factor error
    pub fn invalid_load_factor(value: f32, max: f32) -> Self {
        Self::InvalidLoadFactor { value, max }
    }

    /// Create a table full error
    pub fn table_full(capacity: usize) -> Self {
        Self::TableFull { capacity }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a corrupted structure error
    pub fn corrupted<S: Into<String>>(message: S) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }

    /// Check if the caller can reasonably carry on after this error
    ///
    /// Duplicate and absent keys are expected outcomes of point operations;
    /// the rest point at bad input or a broken structure.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::AlreadyExists => true,
            Self::KeyNotFound => true,
            Self::InvalidLoadFactor { .. } => false,
            Self::TableFull { .. } => false,
            Self::Configuration { .. } => false,
            Self::Corrupted { .. } => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::AlreadyExists => "duplicate",
            Self::KeyNotFound => "lookup",
            Self::InvalidLoadFactor { .. } => "config",
            Self::TableFull { .. } => "capacity",
            Self::Configuration { .. } => "config",
            Self::Corrupted { .. } => "invariant",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, LexmapError>;

/// Check that a load factor lies in `(0, max]`
#[inline]
pub fn check_load_factor(value: f32, max: f32) -> Result<()> {
    if value.is_nan() || value <= 0.0 || value > max {
        Err(LexmapError::invalid_load_factor(value, max))
    } else {
        Ok(())
    }
}
