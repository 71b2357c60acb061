//! Configuration APIs for lexmap
//!
//! Hash tables are tuned through [`HashTableConfig`]. Configurations are
//! validated before use and can be built from presets, loaded from environment
//! variables, or saved to and loaded from JSON files.
//!
//! # Preset Configurations
//!
//! ```rust
//! use lexmap::config::{Config, HashTableConfig};
//!
//! // Low load factor, large initial table
//! let config = HashTableConfig::performance_preset();
//!
//! // Tables packed up to the maximum load factor
//! let config = HashTableConfig::memory_preset();
//! ```
//!
//! # Environment Initialization
//!
//! ```rust
//! use lexmap::config::{Config, HashTableConfig};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads LEXMAP_TABLE_INITIAL_SIZE, LEXMAP_TABLE_LOAD_FACTOR, ...
//! let config = HashTableConfig::from_env()?;
//!
//! // Same variables under a custom prefix
//! let config = HashTableConfig::from_env_with_prefix("WORDS_")?;
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use std::env;
use std::fmt;
use std::path::Path;

pub mod hash_table;


pub use hash_table::HashTableConfig;

/// Default prefix for environment variables
pub const ENV_PREFIX: &str = "LEXMAP_";

/// Common configuration trait providing validation, environment initialization,
/// and preset management functionality.
pub trait Config: Clone + fmt::Debug {
    /// Validate the configuration for correctness and consistency.
    fn validate(&self) -> Result<()>;

    /// Initialize configuration from environment variables with the
    /// [`ENV_PREFIX`] prefix.
    fn from_env() -> Result<Self>
    where
        Self: Default,
    {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Initialize configuration from environment variables with a custom prefix.
    ///
    /// Unset or unparsable variables keep their default value; the result is
    /// validated before it is returned.
    fn from_env_with_prefix(prefix: &str) -> Result<Self>
    where
        Self: Default;

    /// Get a throughput-oriented preset configuration.
    fn performance_preset() -> Self;

    /// Get a memory-oriented preset configuration.
    fn memory_preset() -> Self;

    /// Get a balanced preset configuration.
    fn balanced_preset() -> Self
    where
        Self: Default,
    {
        Self::default()
    }

    /// Save configuration to a JSON file.
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Load and validate configuration from a JSON file.
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self>;
}

/// Parse an environment variable, falling back to `default` when it is unset
/// or does not parse.
pub fn parse_env_var<T>(var_name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(var_name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
