//! Hash table configuration.

use super::{parse_env_var, Config};
use crate::error::{check_load_factor, LexmapError, Result};
use crate::hash_map::primes::MAX_TABLE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default requested table size; rounded up to the next prime
pub const DEFAULT_INITIAL_SIZE: usize = 19;
/// Default rehash threshold
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;
/// Default upper bound for the rehash threshold
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;

/// Sizing and rehash policy shared by both hash tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashTableConfig {
    /// Requested table size, rounded up to the next prime
    pub initial_size: usize,
    /// Rehash once `elements / table_size` exceeds this value
    pub load_factor: f32,
    /// Largest value `load_factor` may take
    pub max_load_factor: f32,
}

impl Default for HashTableConfig {
    fn default() -> Self {
        Self {
            initial_size: DEFAULT_INITIAL_SIZE,
            load_factor: DEFAULT_LOAD_FACTOR,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

impl HashTableConfig {
    /// Default configuration with a different initial size
    pub fn with_initial_size(initial_size: usize) -> Self {
        Self {
            initial_size,
            ..Self::default()
        }
    }

    /// Builder-style load factor override
    pub fn load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }
}

impl Config for HashTableConfig {
    fn validate(&self) -> Result<()> {
        if self.initial_size < 2 {
            return Err(LexmapError::configuration(format!(
                "initial_size must be at least 2, got {}",
                self.initial_size
            )));
        }
        if self.initial_size > MAX_TABLE_SIZE {
            return Err(LexmapError::configuration(format!(
                "initial_size must be at most {}, got {}",
                MAX_TABLE_SIZE, self.initial_size
            )));
        }
        if !self.max_load_factor.is_finite() || self.max_load_factor <= 0.0 {
            return Err(LexmapError::configuration(format!(
                "max_load_factor must be a positive finite number, got {}",
                self.max_load_factor
            )));
        }
        check_load_factor(self.load_factor, self.max_load_factor)
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.initial_size =
            parse_env_var(&format!("{}TABLE_INITIAL_SIZE", prefix), config.initial_size);
        config.load_factor =
            parse_env_var(&format!("{}TABLE_LOAD_FACTOR", prefix), config.load_factor);
        config.max_load_factor = parse_env_var(
            &format!("{}TABLE_MAX_LOAD_FACTOR", prefix),
            config.max_load_factor,
        );
        config.validate()?;
        log::debug!("Hash table config from environment ({}*): {:?}", prefix, config);
        Ok(config)
    }

    fn performance_preset() -> Self {
        Self {
            initial_size: 1021,
            load_factor: 0.5,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }

    fn memory_preset() -> Self {
        Self {
            initial_size: DEFAULT_INITIAL_SIZE,
            load_factor: DEFAULT_MAX_LOAD_FACTOR,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self).map_err(|e| {
            LexmapError::configuration(format!("Failed to serialize hash table config: {}", e))
        })?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            LexmapError::configuration(format!("Failed to parse hash table config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }
}
