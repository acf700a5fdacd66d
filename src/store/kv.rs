//! Ordered byte key/value store with copy-on-write clones.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────┐
//!   │                     KvStore<H>                           │
//!   │                                                          │
//!   │   hasher: H (KeyHasher strategy)                         │
//!   │   total_size: Σ allocated() over live records            │
//!   │                                                          │
//!   │   ┌────────────────────────────────────────────────────┐ │
//!   │   │ EntryIndex                                         │ │
//!   │   │   slots ── bucket chains ── free list ── order list│ │
//!   │   │   each occupied slot ──► Arc<ItemRecord>           │ │
//!   │   └────────────────────────────────────────────────────┘ │
//!   └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Operations
//! - `put` / `get` / `delete`: O(1) average by key.
//! - `bump_recent` / `bump_least_recent`: O(1) order-list relink; the
//!   primitives LRU/MRU policies are built from by the caller.
//! - `first` / `pop_first` / `insert_as_oldest`: oldest-end access.
//! - `iter` / `keys` / `values` / `entries`: order-list order.
//!
//! ## Cloning
//! `clone()` deep-copies the entry and bucket arrays and shares the item
//! records; both stores then treat every shared record as copy-on-write, so
//! a `put` into either never alters bytes the other can observe.
//!
//! ## Thread Safety
//! `KvStore` is single-threaded by design; all operations run to completion
//! on the caller's thread. Wrap it in
//! [`ConcurrentKvStore`](crate::store::ConcurrentKvStore) (feature
//! `concurrency`) for external mutual exclusion.

use std::fmt;
use std::sync::Arc;

use crate::ds::entry_index::{EntryIndex, Pos};
use crate::ds::item::ItemRecord;
use crate::error::AllocError;
#[cfg(any(test, debug_assertions))]
use crate::error::InvariantError;
use crate::hash::{KeyHasher, MixHasher};

/// In-memory store for opaque byte keys and values, ordered by insertion as
/// adjusted by the reorder primitives.
#[derive(Clone)]
pub struct KvStore<H = MixHasher> {
    index: EntryIndex,
    hasher: H,
    total_size: usize,
}

impl KvStore {
    /// Creates an empty store with the default [`MixHasher`].
    pub fn new() -> Self {
        Self::with_hasher(MixHasher)
    }
}

impl Default for KvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: KeyHasher> KvStore<H> {
    /// Creates an empty store using `hasher` as the key hashing strategy.
    pub fn with_hasher(hasher: H) -> Self {
        Self {
            index: EntryIndex::new(),
            hasher,
            total_size: 0,
        }
    }

    /// Inserts or overwrites `key`, refreshing its recency to newest.
    ///
    /// Overwrites reuse the existing record when it is exclusively owned and
    /// the new value fits its reuse window; otherwise a private replacement
    /// is allocated first and the old record's reference released after
    /// (copy-on-write). On allocation failure the store keeps its previous
    /// contents.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), AllocError> {
        self.put_at(key, value).map(|_| ())
    }

    /// Like [`put`](Self::put), but leaves the entry at the oldest end of
    /// the order list instead of the newest.
    pub fn insert_as_oldest(&mut self, key: &[u8], value: &[u8]) -> Result<(), AllocError> {
        let pos = self.put_at(key, value)?;
        self.index.move_to_oldest(pos);
        Ok(())
    }

    fn put_at(&mut self, key: &[u8], value: &[u8]) -> Result<Pos, AllocError> {
        let hash = self.hasher.hash_key(key);
        if let Some(pos) = self.index.find(hash, key) {
            self.index.move_to_newest(pos);
            self.update_value(pos, value)?;
            return Ok(pos);
        }

        let pos = self.index.insert(hash)?;
        match ItemRecord::new(key, value, pos) {
            Ok(record) => {
                self.total_size += record.allocated();
                self.index.set_record(pos, Arc::new(record));
                Ok(pos)
            }
            Err(err) => {
                // Roll the fresh slot back; the table-growth side effects
                // stay, which is allowed (they are valid state).
                let _ = self.index.remove(pos);
                Err(err)
            }
        }
    }

    fn update_value(&mut self, pos: Pos, value: &[u8]) -> Result<(), AllocError> {
        let Some(record) = self.index.record_mut(pos) else {
            unreachable!("matched entry without a record");
        };

        if record.fits_value(value.len()) {
            // In place only with exclusive ownership; a shared record must
            // never be mutated through this store.
            if let Some(exclusive) = Arc::get_mut(record) {
                debug_assert_eq!(exclusive.owner(), pos);
                exclusive.set_value(value);
                return Ok(());
            }
        }

        let replacement = Arc::new(ItemRecord::new(record.key(), value, pos)?);
        self.total_size += replacement.allocated();
        let old = std::mem::replace(record, replacement);
        self.total_size -= old.allocated();
        // Dropping `old` releases this store's reference; the bytes are
        // freed only if no clone still shares them.
        Ok(())
    }

    /// Returns the value for `key` without touching recency.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let pos = self.index.find(self.hasher.hash_key(key), key)?;
        self.index.record(pos).map(|r| r.value())
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.index.find(self.hasher.hash_key(key), key).is_some()
    }

    /// Moves `key` to the newest end of the order list and returns its
    /// value; `None` if absent.
    pub fn bump_recent(&mut self, key: &[u8]) -> Option<&[u8]> {
        let pos = self.index.find(self.hasher.hash_key(key), key)?;
        self.index.move_to_newest(pos);
        self.index.record(pos).map(|r| r.value())
    }

    /// Moves `key` to the oldest end of the order list and returns its
    /// value; `None` if absent.
    pub fn bump_least_recent(&mut self, key: &[u8]) -> Option<&[u8]> {
        let pos = self.index.find(self.hasher.hash_key(key), key)?;
        self.index.move_to_oldest(pos);
        self.index.record(pos).map(|r| r.value())
    }

    /// Removes `key` and returns its value; `None` if absent.
    pub fn delete(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        let pos = self.index.find(self.hasher.hash_key(key), key)?;
        let record = self.index.remove(pos)?;
        self.total_size -= record.allocated();
        Some(record.value().to_vec())
    }

    /// The oldest key/value pair, without removing it.
    pub fn first(&self) -> Option<(&[u8], &[u8])> {
        let pos = self.index.oldest()?;
        let record = self.index.record(pos)?;
        Some((record.key(), record.value()))
    }

    /// Removes and returns the oldest key/value pair.
    pub fn pop_first(&mut self) -> Option<(Vec<u8>, Vec<u8>)> {
        let pos = self.index.oldest()?;
        let record = self.index.remove(pos)?;
        self.total_size -= record.allocated();
        Some((record.key().to_vec(), record.value().to_vec()))
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the store holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Sum of allocated record sizes. Accounting only, never enforced.
    pub fn payload_size(&self) -> usize {
        self.total_size
    }

    /// Payload plus the entry and bucket arrays and the store header itself.
    pub fn footprint(&self) -> usize {
        std::mem::size_of::<Self>() + self.index.table_bytes() + self.total_size
    }

    /// Iterates pairs from oldest to newest. Lazy and restartable; mutating
    /// the store while an iterator is live is prevented by borrowing.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            index: &self.index,
            current: self.index.oldest(),
        }
    }

    /// All keys, oldest to newest.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.iter().map(|(k, _)| k.to_vec()).collect()
    }

    /// All values, oldest to newest.
    pub fn values(&self) -> Vec<Vec<u8>> {
        self.iter().map(|(_, v)| v.to_vec()).collect()
    }

    /// All pairs, oldest to newest.
    pub fn entries(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.iter().map(|(k, v)| (k.to_vec(), v.to_vec())).collect()
    }

    /// Releases every record and resets the store to its initial state.
    pub fn clear(&mut self) {
        self.index.clear();
        self.total_size = 0;
    }

    /// Verifies index consistency and payload accounting.
    #[cfg(any(test, debug_assertions))]
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.index.check_invariants()?;
        let payload: usize = self
            .index
            .iter_order()
            .filter_map(|pos| self.index.record(pos))
            .map(|r| r.allocated())
            .sum();
        if payload != self.total_size {
            return Err(InvariantError::new(format!(
                "total_size is {} but records sum to {payload}",
                self.total_size
            )));
        }
        Ok(())
    }
}

impl<'a, H: KeyHasher> IntoIterator for &'a KvStore<H> {
    type Item = (&'a [u8], &'a [u8]);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<H> fmt::Debug for KvStore<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<KvStore")?;
        let mut current = self.index.oldest();
        while let Some(pos) = current {
            if let Some(record) = self.index.record(pos) {
                write!(
                    f,
                    " {:?}=>{:?}",
                    String::from_utf8_lossy(record.key()),
                    String::from_utf8_lossy(record.value())
                )?;
            }
            current = self.index.next_in_order(pos);
        }
        write!(f, ">")
    }
}

/// Iterator over `(key, value)` pairs from oldest to newest.
pub struct Iter<'a> {
    index: &'a EntryIndex,
    current: Option<Pos>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let pos = self.current?;
            self.current = self.index.next_in_order(pos);
            if let Some(record) = self.index.record(pos) {
                return Some((record.key(), record.value()));
            }
        }
    }
}
