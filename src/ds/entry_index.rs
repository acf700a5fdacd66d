//! Hash-table core: one flat slot array threaded by three index-space lists.
//!
//! ## Architecture
//!
//! Every structure lives in the same `[0, capacity)` position space; links
//! are `Option<Pos>` values, never pointers:
//!
//! ```text
//!   buckets (hash % nbuckets)          entries (flat slot array)
//!   ┌─────┬───────────────┐   ┌─────┬──────┬─────────────┬────────────┬──────┐
//!   │ buc │ chain head    │   │ pos │ hash │ bucket_next │ order link │ item │
//!   ├─────┼───────────────┤   ├─────┼──────┼─────────────┼────────────┼──────┤
//!   │  0  │ Some(2) ──────┼──►│  2  │ h(a) │ Some(0)     │ prev/next  │ a=.. │
//!   │  1  │ None          │   │  0  │ h(b) │ None        │ prev/next  │ b=.. │
//!   │ ... │               │   │  1  │ (free, bucket_next links free list)   │
//!   └─────┴───────────────┘   └─────┴──────┴─────────────┴────────────┴──────┘
//!
//!   order list:  head (oldest) ◄──► ... ◄──► tail (newest)
//!   free list:   free_head ──► singly linked through bucket_next
//! ```
//!
//! Occupied slots are partitioned exactly by the bucket chains and exactly by
//! the order list; vacant slots exactly by the free list. `bucket_next`
//! doubles as the free-list link while a slot is vacant, keeping the entry
//! footprint small at the cost of an O(chain) unlink scan on removal.
//!
//! ## Growth policy
//!
//! - Entry array: ×1.5 when full (initial 32), new slots threaded onto the
//!   free list. Amortizes reallocation cost.
//! - Bucket table: rebuilt at `(nbuckets + 1) * 2 - 1` (15, 31, 63, ...)
//!   whenever `len >= nbuckets * 2`, bounding mean chain length to ~2. Odd
//!   counts avoid power-of-two periodicity in poor hash distributions.
//!
//! Both growth steps allocate before mutating, so an allocation failure
//! leaves the prior state fully intact.

use std::sync::Arc;

use crate::ds::item::ItemRecord;
use crate::error::AllocError;
#[cfg(any(test, debug_assertions))]
use crate::error::InvariantError;

const MIN_ENTRIES: usize = 32;
const MIN_BUCKETS: usize = 15;
const LOAD_FACTOR: usize = 2;

/// Position of a slot in the entry array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos(pub(crate) u32);

impl Pos {
    /// The slot's array index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default)]
struct Entry {
    /// Cached key hash; valid only while the slot is occupied.
    hash: u32,
    /// Next slot in this bucket chain, or the free-list link while vacant.
    bucket_next: Option<Pos>,
    order_next: Option<Pos>,
    order_prev: Option<Pos>,
    item: Option<Arc<ItemRecord>>,
}

/// Flat entry array + bucket table + free list + intrusive order list.
///
/// Cloning deep-copies both arrays and shares the item records (each live
/// `Arc` gains one reference), which is exactly the copy-on-write clone
/// contract of [`KvStore`](crate::store::KvStore).
#[derive(Debug, Clone, Default)]
pub struct EntryIndex {
    entries: Vec<Entry>,
    buckets: Vec<Option<Pos>>,
    free_head: Option<Pos>,
    order_head: Option<Pos>,
    order_tail: Option<Pos>,
    len: u32,
}

impl EntryIndex {
    /// Creates an empty index; allocates nothing until the first insert.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total slots allocated, occupied or free.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Current bucket count.
    pub fn nbuckets(&self) -> usize {
        self.buckets.len()
    }

    /// Bytes held by the entry and bucket arrays.
    pub fn table_bytes(&self) -> usize {
        self.entries.len() * std::mem::size_of::<Entry>()
            + self.buckets.len() * std::mem::size_of::<Option<Pos>>()
    }

    /// Finds the occupied slot whose key equals `key`, filtering on the
    /// cached hash before comparing bytes.
    pub fn find(&self, hash: u32, key: &[u8]) -> Option<Pos> {
        if self.len == 0 {
            return None;
        }
        let mut cur = self.buckets[hash as usize % self.buckets.len()];
        while let Some(pos) = cur {
            let entry = &self.entries[pos.index()];
            if entry.hash == hash {
                if let Some(item) = entry.item.as_deref() {
                    if item.key() == key {
                        return Some(pos);
                    }
                }
            }
            cur = entry.bucket_next;
        }
        None
    }

    /// Reserves a slot for a new key with the given hash: grows the entry
    /// array and bucket table as needed, links the slot into its bucket chain
    /// and onto the newest end of the order list.
    ///
    /// The slot's record starts out unset; callers attach it with
    /// [`set_record`](Self::set_record) or roll back with
    /// [`remove`](Self::remove).
    pub fn insert(&mut self, hash: u32) -> Result<Pos, AllocError> {
        if self.len() == self.entries.len() {
            self.grow_entries()?;
        }
        if self.len() >= self.buckets.len() * LOAD_FACTOR {
            self.grow_buckets()?;
        }

        let Some(pos) = self.free_head else {
            unreachable!("free list empty after entry growth");
        };
        self.free_head = self.entries[pos.index()].bucket_next;

        let bucket = hash as usize % self.buckets.len();
        let chain = self.buckets[bucket];
        let entry = &mut self.entries[pos.index()];
        entry.hash = hash;
        entry.item = None;
        entry.bucket_next = chain;
        self.buckets[bucket] = Some(pos);

        self.link_newest(pos);
        self.len += 1;
        Ok(pos)
    }

    /// Releases the slot at `pos`: unlinks it from its bucket chain and the
    /// order list, pushes it onto the free list, and returns its record.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is not on the chain its cached hash selects. Callers
    /// must only remove positions obtained from a successful [`find`]
    /// (continuing past that would compound the corruption).
    ///
    /// [`find`]: Self::find
    pub fn remove(&mut self, pos: Pos) -> Option<Arc<ItemRecord>> {
        let hash = self.entries[pos.index()].hash;
        let bucket = hash as usize % self.buckets.len();

        let mut cur = self.buckets[bucket];
        let mut prev: Option<Pos> = None;
        while let Some(p) = cur {
            if p == pos {
                break;
            }
            prev = Some(p);
            cur = self.entries[p.index()].bucket_next;
        }
        assert_eq!(
            cur,
            Some(pos),
            "slot {} missing from bucket chain {bucket}",
            pos.index()
        );

        let next = self.entries[pos.index()].bucket_next;
        match prev {
            Some(p) => self.entries[p.index()].bucket_next = next,
            None => self.buckets[bucket] = next,
        }

        self.unlink_order(pos);

        let entry = &mut self.entries[pos.index()];
        entry.hash = 0;
        entry.bucket_next = self.free_head;
        let item = entry.item.take();
        self.free_head = Some(pos);
        self.len -= 1;
        item
    }

    /// The record at `pos`, if the slot is occupied.
    pub fn record(&self, pos: Pos) -> Option<&Arc<ItemRecord>> {
        self.entries[pos.index()].item.as_ref()
    }

    /// Mutable handle to the record at `pos`, if the slot is occupied.
    pub fn record_mut(&mut self, pos: Pos) -> Option<&mut Arc<ItemRecord>> {
        self.entries[pos.index()].item.as_mut()
    }

    /// Attaches `record` to the slot at `pos`, replacing any previous one.
    pub fn set_record(&mut self, pos: Pos, record: Arc<ItemRecord>) {
        self.entries[pos.index()].item = Some(record);
    }

    /// Relinks `pos` at the newest end of the order list. O(1); no-op if
    /// already newest.
    pub fn move_to_newest(&mut self, pos: Pos) {
        debug_assert!(self.entries[pos.index()].item.is_some());
        if self.order_tail == Some(pos) {
            return;
        }
        self.unlink_order(pos);
        self.link_newest(pos);
    }

    /// Relinks `pos` at the oldest end of the order list. O(1); no-op if
    /// already oldest.
    pub fn move_to_oldest(&mut self, pos: Pos) {
        debug_assert!(self.entries[pos.index()].item.is_some());
        if self.order_head == Some(pos) {
            return;
        }
        self.unlink_order(pos);
        self.link_oldest(pos);
    }

    /// Oldest occupied slot (order-list head).
    pub fn oldest(&self) -> Option<Pos> {
        self.order_head
    }

    /// Newest occupied slot (order-list tail).
    pub fn newest(&self) -> Option<Pos> {
        self.order_tail
    }

    /// Successor of `pos` in order-list order (towards newest).
    pub fn next_in_order(&self, pos: Pos) -> Option<Pos> {
        self.entries[pos.index()].order_next
    }

    /// Iterates occupied positions from oldest to newest.
    pub fn iter_order(&self) -> OrderIter<'_> {
        OrderIter {
            index: self,
            current: self.order_head,
        }
    }

    /// Drops every record and returns the index to its initial empty state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn grow_entries(&mut self) -> Result<(), AllocError> {
        debug_assert!(self.free_head.is_none());
        let old_cap = self.entries.len();
        let new_cap = if old_cap == 0 {
            MIN_ENTRIES
        } else {
            old_cap + old_cap / 2
        };
        let additional = new_cap - old_cap;
        self.entries
            .try_reserve(additional)
            .map_err(|_| AllocError::new("entry table", additional * std::mem::size_of::<Entry>()))?;
        // Thread the new slots onto the free list in ascending order.
        for i in old_cap..new_cap {
            let next = if i + 1 < new_cap {
                Some(Pos(i as u32 + 1))
            } else {
                None
            };
            self.entries.push(Entry {
                bucket_next: next,
                ..Entry::default()
            });
        }
        self.free_head = Some(Pos(old_cap as u32));
        Ok(())
    }

    fn grow_buckets(&mut self) -> Result<(), AllocError> {
        let new_n = if self.buckets.is_empty() {
            MIN_BUCKETS
        } else {
            (self.buckets.len() + 1) * 2 - 1
        };
        let mut new_buckets: Vec<Option<Pos>> = Vec::new();
        new_buckets
            .try_reserve_exact(new_n)
            .map_err(|_| AllocError::new("bucket table", new_n * std::mem::size_of::<Option<Pos>>()))?;
        new_buckets.resize(new_n, None);

        // Rehash every occupied slot into the new chains; free-list links
        // (also stored in bucket_next) stay untouched.
        for i in 0..self.entries.len() {
            if self.entries[i].item.is_none() {
                continue;
            }
            let bucket = self.entries[i].hash as usize % new_n;
            self.entries[i].bucket_next = new_buckets[bucket];
            new_buckets[bucket] = Some(Pos(i as u32));
        }
        self.buckets = new_buckets;
        Ok(())
    }

    fn link_newest(&mut self, pos: Pos) {
        let tail = self.order_tail;
        {
            let entry = &mut self.entries[pos.index()];
            entry.order_next = None;
            entry.order_prev = tail;
        }
        match tail {
            Some(t) => self.entries[t.index()].order_next = Some(pos),
            None => self.order_head = Some(pos),
        }
        self.order_tail = Some(pos);
    }

    fn link_oldest(&mut self, pos: Pos) {
        let head = self.order_head;
        {
            let entry = &mut self.entries[pos.index()];
            entry.order_prev = None;
            entry.order_next = head;
        }
        match head {
            Some(h) => self.entries[h.index()].order_prev = Some(pos),
            None => self.order_tail = Some(pos),
        }
        self.order_head = Some(pos);
    }

    fn unlink_order(&mut self, pos: Pos) {
        let (prev, next) = {
            let entry = &self.entries[pos.index()];
            (entry.order_prev, entry.order_next)
        };
        match prev {
            Some(p) => self.entries[p.index()].order_next = next,
            None => self.order_head = next,
        }
        match next {
            Some(n) => self.entries[n.index()].order_prev = prev,
            None => self.order_tail = prev,
        }
        let entry = &mut self.entries[pos.index()];
        entry.order_prev = None;
        entry.order_next = None;
    }

    /// Verifies that the bucket chains, order list, and free list partition
    /// the slot space consistently.
    #[cfg(any(test, debug_assertions))]
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        use std::collections::HashSet;

        let occupied: HashSet<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.item.is_some())
            .map(|(i, _)| i)
            .collect();
        if occupied.len() != self.len() {
            return Err(InvariantError::new(format!(
                "len is {} but {} slots hold records",
                self.len(),
                occupied.len()
            )));
        }

        // Bucket chains cover exactly the occupied slots, each in the chain
        // its cached hash selects.
        let mut chained = HashSet::new();
        for (bucket, head) in self.buckets.iter().enumerate() {
            let mut cur = *head;
            while let Some(pos) = cur {
                let entry = &self.entries[pos.index()];
                if entry.item.is_none() {
                    return Err(InvariantError::new(format!(
                        "vacant slot {} linked in bucket {bucket}",
                        pos.index()
                    )));
                }
                if entry.hash as usize % self.buckets.len() != bucket {
                    return Err(InvariantError::new(format!(
                        "slot {} chained in bucket {bucket} but hashes elsewhere",
                        pos.index()
                    )));
                }
                if !chained.insert(pos.index()) {
                    return Err(InvariantError::new(format!(
                        "slot {} appears in more than one chain position",
                        pos.index()
                    )));
                }
                cur = entry.bucket_next;
            }
        }
        if chained != occupied {
            return Err(InvariantError::new(
                "bucket chains do not cover exactly the occupied slots",
            ));
        }

        // Order list is a consistent double linkage over the occupied slots.
        let mut ordered = HashSet::new();
        let mut prev = None;
        let mut cur = self.order_head;
        while let Some(pos) = cur {
            if !ordered.insert(pos.index()) {
                return Err(InvariantError::new(format!(
                    "order list cycles at slot {}",
                    pos.index()
                )));
            }
            let entry = &self.entries[pos.index()];
            if entry.order_prev != prev {
                return Err(InvariantError::new(format!(
                    "order prev link broken at slot {}",
                    pos.index()
                )));
            }
            prev = cur;
            cur = entry.order_next;
        }
        if prev != self.order_tail {
            return Err(InvariantError::new("order tail does not end the list"));
        }
        if ordered != occupied {
            return Err(InvariantError::new(
                "order list does not cover exactly the occupied slots",
            ));
        }

        // Free list covers exactly the vacant slots.
        let mut free = HashSet::new();
        let mut cur = self.free_head;
        while let Some(pos) = cur {
            if self.entries[pos.index()].item.is_some() {
                return Err(InvariantError::new(format!(
                    "occupied slot {} on the free list",
                    pos.index()
                )));
            }
            if !free.insert(pos.index()) {
                return Err(InvariantError::new(format!(
                    "free list cycles at slot {}",
                    pos.index()
                )));
            }
            cur = self.entries[pos.index()].bucket_next;
        }
        if free.len() != self.entries.len() - self.len() {
            return Err(InvariantError::new(format!(
                "{} slots on the free list, expected {}",
                free.len(),
                self.entries.len() - self.len()
            )));
        }

        Ok(())
    }
}

/// Iterator over occupied positions from oldest to newest.
pub struct OrderIter<'a> {
    index: &'a EntryIndex,
    current: Option<Pos>,
}

impl<'a> Iterator for OrderIter<'a> {
    type Item = Pos;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.current?;
        self.current = self.index.next_in_order(pos);
        Some(pos)
    }
}
