//! DocumentStore: documents keyed by generated ids in a `ChainedHashTable`.

use crate::chained_hash_table::ChainedHashTable;
use crate::config::TableConfig;
use crate::document::Document;
use crate::error::{InsertError, StoreError, TableError};
use crate::key_generator::{KeyGenerator, KeyMode};
use core::hash::BuildHasher;
use std::collections::hash_map::RandomState;

pub struct DocumentStore<S = RandomState> {
    table: ChainedHashTable<String, Document, S>,
    keys: KeyGenerator,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_config(config: TableConfig) -> Result<Self, TableError> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> DocumentStore<S>
where
    S: BuildHasher + Clone,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: ChainedHashTable::with_hasher(hasher),
            keys: KeyGenerator::new(),
        }
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self, TableError> {
        Ok(Self {
            table: ChainedHashTable::with_config_and_hasher(config, hasher)?,
            keys: KeyGenerator::new(),
        })
    }

    /// Build a document stamped now and store it. Returns its id.
    pub fn add(
        &mut self,
        title: impl Into<String>,
        author: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Result<String, StoreError> {
        self.insert(Document::new(title, author, file_path))
    }

    /// Store `document` under an id derived from its title and path.
    /// A generated id that is already taken is reported, not retried.
    pub fn insert(&mut self, document: Document) -> Result<String, StoreError> {
        let id = self.keys.generate(document.title(), document.file_path());
        match self.table.insert(id.clone(), document) {
            Ok(()) => {
                log::debug!("stored document {}", id);
                Ok(id)
            }
            Err(InsertError::DuplicateKey) => Err(StoreError::DuplicateKey(id)),
            Err(InsertError::Allocation(e)) => Err(StoreError::Allocation(e)),
        }
    }

    pub fn find(&self, id: &str) -> Option<&Document> {
        self.table.find(id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.table.remove(id)
    }

    /// Visit every stored document with its id. Order is unspecified.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, &Document),
    {
        self.table.for_each(|id, doc| visitor(id.as_str(), doc));
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn key_mode(&self) -> KeyMode {
        self.keys.mode()
    }
}
