//! chained-hashtable: a separately chained hash table with explicit growth,
//! and a small document store that keys records by a content digest.
//!
//! Internal Design:
//!
//! Summary
//! - Layers:
//!   - ChainedHashTable<K, V, S>: bucket array of singly linked chains,
//!     duplicate rejection, doubling growth at a load-factor threshold.
//!   - KeyGenerator: derives a short id from a document's title and path
//!     salted with the clock (truncated MD5, weak-hash fallback).
//!   - DocumentStore: glues the two; builds a `Document`, asks for an id,
//!     inserts. This is the surface a console front-end talks to.
//!
//! Constraints
//! - Single-threaded and synchronous; every structural change takes
//!   `&mut self`. Share a table by putting the whole thing behind one lock.
//! - No I/O besides the clock read in `KeyGenerator` and `log` records.
//! - Failures are values: duplicate keys, invalid configs and failed bucket
//!   allocations come back as `Err`, lookup misses as `None`/`false`.
//!
//! Chains
//! - Nodes live in a `slotmap` arena; bucket heads and `next` links are
//!   arena keys. Unlinking rewrites one link and frees one slot, so there are
//!   no dangling pointers to reason about.
//! - New nodes go to the tail of their chain, so a bucket keeps insertion
//!   order. Iteration walks buckets ascending, then chains front to back.
//!   That is not global insertion order and growth may reshuffle it.
//!
//! Growth
//! - Before an insert, if `(len + 1) / capacity` exceeds the load factor the
//!   table doubles. The new bucket array is allocated fallibly first; only
//!   then is every entry moved, chain by chain, into a fresh table through
//!   the same `add` path used for inserts, with growth suppressed so the
//!   migration cannot recurse. The fresh table then replaces the old one.
//! - A duplicate key that would have triggered growth is rejected before
//!   growing, so a rejected insert never changes the table.
//! - The table never shrinks.
//!
//! Notes and non-goals
//! - No persistence, no concurrent access, no rehash-on-shrink.
//! - The hasher is a `BuildHasher` (default `RandomState`): bucket indices
//!   are stable for the life of a table, not across tables.

mod chained_hash_table;
mod chained_hash_table_proptest;
pub mod config;
mod document;
pub mod error;
mod key_generator;
mod store;

// Public surface
pub use chained_hash_table::{ChainedHashTable, Iter};
pub use config::TableConfig;
pub use document::Document;
pub use error::{AllocError, ConfigError, InsertError, StoreError, TableError};
pub use key_generator::{KeyGenerator, KeyMode, KEY_LEN};
pub use store::DocumentStore;
