//! Error types for the table and the document store.

use std::collections::TryReserveError;
use thiserror::Error;

/// Failure to allocate a bucket array.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    #[error("failed to allocate {capacity} buckets: {source}")]
    Exhausted {
        capacity: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("bucket count overflows usize when doubling {capacity}")]
    CapacityOverflow { capacity: usize },
}

/// Rejected table configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("initial capacity must be at least 1")]
    ZeroCapacity,

    #[error("load factor must be finite and positive, got {0}")]
    InvalidLoadFactor(f64),

    /// One doubling could not bring a single entry under the threshold.
    #[error("{initial_capacity} buckets at load factor {load_factor} hold less than one entry")]
    BelowOneEntry {
        initial_capacity: usize,
        load_factor: f64,
    },
}

/// Errors from building a table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Allocation(#[from] AllocError),
}

/// Errors from `ChainedHashTable::insert`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InsertError {
    /// The key is already present; the table is unchanged.
    #[error("key already exists")]
    DuplicateKey,

    /// Growth failed; the table keeps its pre-growth layout.
    #[error(transparent)]
    Allocation(#[from] AllocError),
}

/// Errors from `DocumentStore` inserts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document with id {0} already exists")]
    DuplicateKey(String),

    #[error(transparent)]
    Allocation(#[from] AllocError),
}
