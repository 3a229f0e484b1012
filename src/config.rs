//! Table sizing parameters.

use crate::error::ConfigError;

/// Bucket count of a freshly built table.
pub const DEFAULT_CAPACITY: usize = 16;

/// Growth triggers when `(len + 1) / capacity` exceeds this.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Configuration for a `ChainedHashTable`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Number of buckets allocated up front.
    pub initial_capacity: usize,

    /// Maximum entries-per-bucket ratio tolerated after an insert.
    pub load_factor: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl TableConfig {
    /// Set the number of buckets allocated up front.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the growth threshold.
    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Capacity must be positive and the threshold finite and positive.
    /// `initial_capacity * load_factor` must also be at least 1: growth
    /// doubles once per insert, and anything less leaves even one entry over
    /// the threshold after that doubling.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !self.load_factor.is_finite() || self.load_factor <= 0.0 {
            return Err(ConfigError::InvalidLoadFactor(self.load_factor));
        }
        if (self.initial_capacity as f64) * self.load_factor < 1.0 {
            return Err(ConfigError::BelowOneEntry {
                initial_capacity: self.initial_capacity,
                load_factor: self.load_factor,
            });
        }
        Ok(())
    }
}
