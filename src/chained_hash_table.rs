//! ChainedHashTable: open hashing with separate chaining and explicit growth.

use crate::config::TableConfig;
use crate::error::{AllocError, InsertError, TableError};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

type Link = Option<DefaultKey>;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    next: Link,
}

/// Whether `add` may grow the table before linking a new node.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Growth {
    Allowed,
    // Migration into a freshly sized table must not recurse into growth.
    Suppressed,
}

/// Key-to-value store with one singly linked chain per bucket.
///
/// Chains are threaded through an arena of nodes: bucket heads and `next`
/// links are arena keys, so unlinking never invalidates another node.
pub struct ChainedHashTable<K, V, S = RandomState> {
    hasher: S,
    buckets: Vec<Link>,
    nodes: SlotMap<DefaultKey, Node<K, V>>,
    load_factor: f64,
}

fn empty_buckets(capacity: usize) -> Result<Vec<Link>, AllocError> {
    let mut buckets = Vec::new();
    buckets
        .try_reserve_exact(capacity)
        .map_err(|source| AllocError::Exhausted { capacity, source })?;
    buckets.resize(capacity, None);
    Ok(buckets)
}

fn doubled(capacity: usize) -> Result<usize, AllocError> {
    capacity
        .checked_mul(2)
        .ok_or(AllocError::CapacityOverflow { capacity })
}

impl<K, V> ChainedHashTable<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_config(config: TableConfig) -> Result<Self, TableError> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V> Default for ChainedHashTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over entries, bucket by bucket, each chain front to back.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Link>,
    nodes: &'a SlotMap<DefaultKey, Node<K, V>>,
    cursor: Link,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(id) = self.cursor {
                let node = self.nodes.get(id)?;
                self.cursor = node.next;
                self.remaining -= 1;
                return Some((&node.key, &node.value));
            }
            self.cursor = *self.buckets.next()?;
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V, S> ChainedHashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    /// Default configuration with a caller-supplied hasher. Infallible: the
    /// default bucket array is small enough that failing to allocate it is
    /// treated like any other out-of-memory condition.
    pub fn with_hasher(hasher: S) -> Self {
        let config = TableConfig::default();
        Self {
            hasher,
            buckets: vec![None; config.initial_capacity],
            nodes: SlotMap::with_key(),
            load_factor: config.load_factor,
        }
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self, TableError> {
        config.validate()?;
        Ok(Self::sized(config.initial_capacity, 0, config.load_factor, hasher)?)
    }

    fn sized(
        capacity: usize,
        entries: usize,
        load_factor: f64,
        hasher: S,
    ) -> Result<Self, AllocError> {
        Ok(Self {
            hasher,
            buckets: empty_buckets(capacity)?,
            nodes: SlotMap::with_capacity_and_key(entries),
            load_factor,
        })
    }

    fn bucket_index<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        (self.hasher.hash_one(q) % self.buckets.len() as u64) as usize
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of buckets. Only ever grows.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Configured growth threshold.
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    fn exceeds_load_factor(&self, entries: usize) -> bool {
        entries as f64 / self.buckets.len() as f64 > self.load_factor
    }

    fn find_node<Q>(&self, q: &Q) -> Option<&Node<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut cursor = self.buckets[self.bucket_index(q)];
        while let Some(id) = cursor {
            let node = self.nodes.get(id)?;
            if node.key.borrow() == q {
                return Some(node);
            }
            cursor = node.next;
        }
        None
    }

    pub fn find<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_node(q).map(|n| &n.value)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_node(q).map(|n| (&n.key, &n.value))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_node(q).is_some()
    }

    /// Insert `key -> value`, growing first if the insert would push the
    /// load past the threshold. A duplicate key leaves the table untouched,
    /// capacity included.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        self.add(key, value, Growth::Allowed)
    }

    fn add(&mut self, key: K, value: V, growth: Growth) -> Result<(), InsertError> {
        if growth == Growth::Allowed && self.exceeds_load_factor(self.len() + 1) {
            if self.contains_key(&key) {
                log::trace!("duplicate key rejected before growth");
                return Err(InsertError::DuplicateKey);
            }
            self.grow()?;
        }

        let index = self.bucket_index(&key);
        let mut tail: Link = None;
        let mut cursor = self.buckets[index];
        while let Some(id) = cursor {
            let Some(node) = self.nodes.get(id) else {
                break;
            };
            if node.key == key {
                log::trace!("duplicate key rejected in bucket {}", index);
                return Err(InsertError::DuplicateKey);
            }
            tail = Some(id);
            cursor = node.next;
        }

        let id = self.nodes.insert(Node {
            key,
            value,
            next: None,
        });
        match tail.and_then(|t| self.nodes.get_mut(t)) {
            Some(last) => last.next = Some(id),
            None => self.buckets[index] = Some(id),
        }
        Ok(())
    }

    /// Double the bucket count by re-adding every entry into a fresh table.
    /// Nothing is moved until the new bucket array has been allocated, so a
    /// failed allocation leaves `self` as it was.
    fn grow(&mut self) -> Result<(), AllocError> {
        let old_capacity = self.capacity();
        let new_capacity = doubled(old_capacity)?;
        let mut resized = Self::sized(
            new_capacity,
            self.len(),
            self.load_factor,
            self.hasher.clone(),
        )?;

        let mut nodes = core::mem::take(&mut self.nodes);
        let moved = nodes.len();
        for &head in &self.buckets {
            let mut cursor = head;
            while let Some(node) = cursor.and_then(|id| nodes.remove(id)) {
                cursor = node.next;
                let migrated = resized.add(node.key, node.value, Growth::Suppressed);
                debug_assert!(migrated.is_ok(), "keys are unique before growth");
            }
        }

        log::debug!(
            "grew table from {} to {} buckets, moved {} entries",
            old_capacity,
            new_capacity,
            moved
        );
        self.buckets = resized.buckets;
        self.nodes = resized.nodes;
        Ok(())
    }

    /// Remove `key`, returning whether it was present. Never shrinks.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).is_some()
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.bucket_index(q);
        let mut prev: Link = None;
        let mut cursor = self.buckets[index];
        while let Some(id) = cursor {
            let node = self.nodes.get(id)?;
            if node.key.borrow() == q {
                let next = node.next;
                match prev.and_then(|p| self.nodes.get_mut(p)) {
                    Some(before) => before.next = next,
                    None => self.buckets[index] = next,
                }
                let node = self.nodes.remove(id)?;
                log::trace!("removed entry from bucket {}", index);
                return Some((node.key, node.value));
            }
            prev = Some(id);
            cursor = node.next;
        }
        None
    }

    /// Entries in bucket order, then chain order. This is not insertion
    /// order, and growth may change it.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            nodes: &self.nodes,
            cursor: None,
            remaining: self.nodes.len(),
        }
    }

    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&K, &V),
    {
        for (k, v) in self.iter() {
            visitor(k, v);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> core::fmt::Debug for ChainedHashTable<K, V, S>
where
    K: Eq + Hash + core::fmt::Debug,
    V: core::fmt::Debug,
    S: BuildHasher + Clone,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::hash::{BuildHasherDefault, Hasher};

    /// Hashes integer keys to themselves, so bucket = key mod capacity.
    #[derive(Default)]
    struct IdentityHasher(u64);
    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = (self.0 << 8) | u64::from(b);
            }
        }
        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
        fn finish(&self) -> u64 {
            self.0
        }
    }
    type Identity = BuildHasherDefault<IdentityHasher>;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key lands in bucket 0
    }

    fn identity_table(capacity: usize) -> ChainedHashTable<u64, &'static str, Identity> {
        let config = TableConfig::default().with_initial_capacity(capacity);
        ChainedHashTable::with_config_and_hasher(config, Identity::default()).unwrap()
    }

    fn keys_in_order<V>(m: &ChainedHashTable<u64, V, Identity>) -> Vec<u64> {
        m.iter().map(|(k, _)| *k).collect()
    }

    /// Invariant: a duplicate key is rejected and the stored value and len are unchanged.
    #[test]
    fn duplicate_insert_rejected() {
        let mut m: ChainedHashTable<String, i32> = ChainedHashTable::new();
        m.insert("dup".to_string(), 1).unwrap();
        assert_eq!(m.insert("dup".to_string(), 2), Err(InsertError::DuplicateKey));
        assert_eq!(m.find("dup"), Some(&1));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: a match at the chain head returns immediately and appends nothing.
    #[test]
    fn duplicate_at_chain_head_does_not_append() {
        let mut m: ChainedHashTable<String, i32, ConstBuildHasher> =
            ChainedHashTable::with_hasher(ConstBuildHasher);
        m.insert("head".to_string(), 1).unwrap();
        m.insert("tail".to_string(), 2).unwrap();
        assert!(m.insert("head".to_string(), 3).is_err());
        assert!(m.insert("tail".to_string(), 4).is_err());
        let seen: Vec<_> = m.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(seen, vec![("head", 1), ("tail", 2)]);
    }

    /// Invariant: colliding keys share a chain in insertion order and resolve by equality.
    #[test]
    fn collisions_chain_in_insertion_order() {
        let mut m: ChainedHashTable<String, i32, ConstBuildHasher> =
            ChainedHashTable::with_hasher(ConstBuildHasher);
        for (i, k) in ["c", "a", "b"].iter().enumerate() {
            m.insert((*k).to_string(), i as i32).unwrap();
        }
        assert_eq!(m.find("a"), Some(&1));
        assert_eq!(m.find("b"), Some(&2));
        assert_eq!(m.find("z"), None);
        let order: Vec<_> = m.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    /// Invariant: removing the head, middle and tail of a chain keeps the rest linked.
    #[test]
    fn unlink_head_middle_and_tail() {
        let mut m: ChainedHashTable<String, i32, ConstBuildHasher> =
            ChainedHashTable::with_hasher(ConstBuildHasher);
        for (i, k) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            m.insert((*k).to_string(), i as i32).unwrap();
        }
        assert!(m.remove("a")); // head
        assert!(m.remove("c")); // middle
        assert!(m.remove("e")); // tail
        assert!(!m.remove("e"));
        let order: Vec<_> = m.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(order, vec!["b", "d"]);
        assert_eq!(m.len(), 2);

        // The chain still accepts appends after unlinking its tail.
        m.insert("f".to_string(), 5).unwrap();
        let order: Vec<_> = m.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(order, vec!["b", "d", "f"]);
    }

    /// Invariant: `remove_entry` hands back the owned pair.
    #[test]
    fn remove_entry_returns_owned_pair() {
        let mut m: ChainedHashTable<String, Vec<u8>> = ChainedHashTable::new();
        m.insert("k".to_string(), vec![1, 2]).unwrap();
        assert_eq!(m.remove_entry("k"), Some(("k".to_string(), vec![1, 2])));
        assert_eq!(m.remove_entry("k"), None);
        assert!(m.is_empty());
    }

    /// Invariant: growth triggers when `(len + 1) / capacity` exceeds the
    /// threshold, exactly once, and doubles the bucket count.
    #[test]
    fn growth_threshold_is_strictly_greater() {
        let mut m = identity_table(4);
        for k in 0..3 {
            m.insert(k, "v").unwrap();
        }
        assert_eq!(m.capacity(), 4, "3/4 == 0.75 does not grow");
        m.insert(3, "v").unwrap();
        assert_eq!(m.capacity(), 8, "4/4 > 0.75 grows once");
        for k in 0..4 {
            assert!(m.contains_key(&k));
        }
    }

    /// Invariant: visitation is bucket-ascending then chain order, and a
    /// resize may reorder entries without changing membership.
    #[test]
    fn iteration_order_follows_buckets_and_changes_on_growth() {
        let mut m = identity_table(4);
        m.insert(2, "two").unwrap();
        m.insert(5, "five").unwrap();
        m.insert(1, "one").unwrap();
        // bucket 1: [5, 1], bucket 2: [2]
        assert_eq!(keys_in_order(&m), vec![5, 1, 2]);

        m.insert(3, "three").unwrap();
        assert_eq!(m.capacity(), 8);
        // bucket 1: [1], 2: [2], 3: [3], 5: [5]
        assert_eq!(keys_in_order(&m), vec![1, 2, 3, 5]);
    }

    /// Invariant: a duplicate that would have triggered growth is rejected
    /// without growing.
    #[test]
    fn duplicate_at_threshold_does_not_grow() {
        let mut m = identity_table(4);
        for k in 0..3 {
            m.insert(k, "v").unwrap();
        }
        assert_eq!(m.insert(1, "again"), Err(InsertError::DuplicateKey));
        assert_eq!(m.capacity(), 4);
        assert_eq!(m.len(), 3);
        assert_eq!(m.find(&1), Some(&"v"));
    }

    /// Invariant: removal never shrinks the bucket array.
    #[test]
    fn remove_does_not_shrink() {
        let mut m = identity_table(2);
        for k in 0..10 {
            m.insert(k, "v").unwrap();
        }
        let grown = m.capacity();
        for k in 0..10 {
            assert!(m.remove(&k));
        }
        assert!(m.is_empty());
        assert_eq!(m.capacity(), grown);
    }

    /// Invariant: a load factor above 1 lets chains grow longer before doubling.
    #[test]
    fn custom_load_factor_delays_growth() {
        let config = TableConfig::default()
            .with_initial_capacity(2)
            .with_load_factor(2.0);
        let mut m: ChainedHashTable<u64, (), Identity> =
            ChainedHashTable::with_config_and_hasher(config, Identity::default()).unwrap();
        for k in 0..4 {
            m.insert(k, ()).unwrap();
        }
        assert_eq!(m.capacity(), 2);
        m.insert(4, ()).unwrap();
        assert_eq!(m.capacity(), 4);
        assert_eq!(m.load_factor(), 2.0);
    }

    /// Invariant: invalid configs and unallocatable bucket arrays are reported, not panicked on.
    #[test]
    fn construction_errors_are_values() {
        let zero = TableConfig::default().with_initial_capacity(0);
        assert!(matches!(
            ChainedHashTable::<String, i32>::with_config(zero),
            Err(TableError::Config(_))
        ));

        let huge = TableConfig::default().with_initial_capacity(usize::MAX);
        assert!(matches!(
            ChainedHashTable::<String, i32>::with_config(huge),
            Err(TableError::Allocation(AllocError::Exhausted { .. }))
        ));
    }

    /// Invariant: doubling past `usize::MAX` is reported as an error value.
    /// `grow` computes the new size before touching anything, so this error
    /// returns with the table unchanged; a table that large cannot be built
    /// in a test, so the size computation is checked on its own.
    #[test]
    fn doubling_overflow_is_an_error() {
        assert_eq!(doubled(16), Ok(32));
        let limit = usize::MAX / 2 + 1;
        let err = doubled(limit).unwrap_err();
        assert_eq!(err, AllocError::CapacityOverflow { capacity: limit });
        assert_eq!(
            err.to_string(),
            format!("bucket count overflows usize when doubling {limit}")
        );
        assert_eq!(
            InsertError::from(err),
            InsertError::Allocation(AllocError::CapacityOverflow { capacity: limit })
        );
    }

    /// Invariant: a failed bucket allocation leaves the table usable and unchanged.
    #[test]
    fn failed_allocation_keeps_existing_table() {
        let mut m = identity_table(4);
        m.insert(1, "one").unwrap();
        assert!(empty_buckets(usize::MAX).is_err());
        assert_eq!(m.capacity(), 4);
        assert_eq!(m.find(&1), Some(&"one"));
    }

    /// Invariant: `iter` is exact-size and `for_each` sees the same entries.
    #[test]
    fn iter_len_and_for_each_agree() {
        let mut m: ChainedHashTable<String, i32> = ChainedHashTable::new();
        for i in 0..40 {
            m.insert(format!("k{i}"), i).unwrap();
        }
        let it = m.iter();
        assert_eq!(it.len(), 40);

        let mut visited = BTreeSet::new();
        m.for_each(|k, _| {
            assert!(visited.insert(k.clone()), "visited twice: {k}");
        });
        let iterated: BTreeSet<_> = (&m).into_iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(visited, iterated);
        assert_eq!(visited.len(), m.len());
    }

    /// Invariant: borrowed lookups (`&str` against `String` keys) work.
    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: ChainedHashTable<String, i32> = ChainedHashTable::new();
        m.insert("hello".to_string(), 1).unwrap();
        assert!(m.contains_key("hello"));
        assert_eq!(
            m.get_key_value("hello"),
            Some((&"hello".to_string(), &1))
        );
        assert!(!m.contains_key("world"));
    }

    #[test]
    fn debug_renders_as_map() {
        let mut m = identity_table(4);
        m.insert(1, "one").unwrap();
        assert_eq!(format!("{:?}", m), r#"{1: "one"}"#);
    }
}
