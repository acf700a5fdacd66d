//! Thread-safe wrapper around [`KvStore`] using a `parking_lot::RwLock`.
//!
//! The core store has no internal locking; this wrapper supplies the
//! whole-store mutual exclusion a multi-threaded host needs. Read
//! accessors return owned bytes since borrows cannot outlive the lock
//! guard; use [`with_read`](ConcurrentKvStore::with_read) /
//! [`with_write`](ConcurrentKvStore::with_write) for compound operations
//! under a single acquisition.

use parking_lot::RwLock;

use crate::error::AllocError;
use crate::hash::{KeyHasher, MixHasher};
use crate::store::kv::KvStore;

#[derive(Debug)]
/// `KvStore` behind a `parking_lot::RwLock`.
pub struct ConcurrentKvStore<H = MixHasher> {
    inner: RwLock<KvStore<H>>,
}

impl ConcurrentKvStore {
    /// Creates an empty store with the default hasher.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(KvStore::new()),
        }
    }
}

impl Default for ConcurrentKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: KeyHasher> ConcurrentKvStore<H> {
    /// Creates an empty store using `hasher`.
    pub fn with_hasher(hasher: H) -> Self {
        Self {
            inner: RwLock::new(KvStore::with_hasher(hasher)),
        }
    }

    /// Inserts or overwrites `key`, refreshing recency.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), AllocError> {
        self.inner.write().put(key, value)
    }

    /// Like `put`, but leaves the entry at the oldest end.
    pub fn insert_as_oldest(&self, key: &[u8], value: &[u8]) -> Result<(), AllocError> {
        self.inner.write().insert_as_oldest(key, value)
    }

    /// Returns the value for `key` without touching recency.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.read().get(key).map(<[u8]>::to_vec)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.inner.read().contains(key)
    }

    /// Moves `key` to newest and returns its value.
    pub fn bump_recent(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.write().bump_recent(key).map(<[u8]>::to_vec)
    }

    /// Moves `key` to oldest and returns its value.
    pub fn bump_least_recent(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner
            .write()
            .bump_least_recent(key)
            .map(<[u8]>::to_vec)
    }

    /// Removes `key` and returns its value.
    pub fn delete(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.write().delete(key)
    }

    /// The oldest pair, without removing it.
    pub fn first(&self) -> Option<(Vec<u8>, Vec<u8>)> {
        self.inner
            .read()
            .first()
            .map(|(k, v)| (k.to_vec(), v.to_vec()))
    }

    /// Removes and returns the oldest pair.
    pub fn pop_first(&self) -> Option<(Vec<u8>, Vec<u8>)> {
        self.inner.write().pop_first()
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if the store holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Sum of allocated record sizes.
    pub fn payload_size(&self) -> usize {
        self.inner.read().payload_size()
    }

    /// Payload plus table arrays and the store header.
    pub fn footprint(&self) -> usize {
        self.inner.read().footprint()
    }

    /// All pairs, oldest to newest.
    pub fn entries(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.inner.read().entries()
    }

    /// Releases every record and resets the store.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Runs `f` with shared access under one lock acquisition.
    pub fn with_read<R>(&self, f: impl FnOnce(&KvStore<H>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` with exclusive access under one lock acquisition.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut KvStore<H>) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Copy-on-write snapshot of the current contents, safe to iterate
    /// without holding the lock.
    pub fn snapshot(&self) -> KvStore<H>
    where
        H: Clone,
    {
        self.inner.read().clone()
    }
}
