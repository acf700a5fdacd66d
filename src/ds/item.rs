//! Variable-length packed key/value records.
//!
//! ## Layout
//!
//! An [`ItemRecord`] stores one key/value pair inline in a single allocation,
//! self-describing so its sizes can be recovered without external
//! bookkeeping:
//!
//! ```text
//!   Compact  (key_size <= 255 and val_size <= 255):
//!   ┌──────────┬──────────┬───────────┬───────────┐
//!   │ key_size │ val_size │ key bytes │ val bytes │
//!   │   1 B    │   1 B    │           │           │
//!   └──────────┴──────────┴───────────┴───────────┘
//!
//!   Extended (either size > 255):
//!   ┌──────────┬──────────┬───────────┬───────────┐
//!   │ key_size │ val_size │ key bytes │ val bytes │
//!   │  4 B LE  │  4 B LE  │           │           │
//!   └──────────┴──────────┴───────────┴───────────┘
//! ```
//!
//! The size class is a tagged discriminant ([`SizeClass`]), re-evaluated on
//! every write that could change a size. The buffer is allocated once at the
//! required size; its length is the record's `allocated()` accounting value.
//!
//! ## Reuse and sharing
//!
//! [`ItemRecord::fits_value`] gates in-place value updates: the class must be
//! unchanged and the new required size must land in the half-to-full window
//! of the current allocation. Records are shared across cloned stores behind
//! `Arc`; mutation additionally requires exclusive ownership
//! (`Arc::get_mut`), otherwise the caller must allocate a private replacement
//! (copy-on-write).

use crate::ds::entry_index::Pos;
use crate::error::AllocError;

/// Per-field size limit of the compact layout.
pub const COMPACT_FIELD_MAX: usize = u8::MAX as usize;

/// Record layout class, chosen by whether both sizes fit in one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    /// 1-byte size fields.
    Compact,
    /// 4-byte little-endian size fields.
    Extended,
}

impl SizeClass {
    /// Selects the class for the given key/value sizes.
    pub fn for_sizes(key_size: usize, val_size: usize) -> Self {
        if key_size <= COMPACT_FIELD_MAX && val_size <= COMPACT_FIELD_MAX {
            SizeClass::Compact
        } else {
            SizeClass::Extended
        }
    }

    /// Header length in bytes for this class.
    pub const fn header_len(self) -> usize {
        match self {
            SizeClass::Compact => 2,
            SizeClass::Extended => 8,
        }
    }
}

/// One key/value pair packed into a single buffer.
///
/// Logically owned by one entry position unless shared via a cloned store;
/// `owner` backs the in-place-update invariant checks.
#[derive(Debug)]
pub struct ItemRecord {
    class: SizeClass,
    owner: Pos,
    data: Box<[u8]>,
}

impl ItemRecord {
    /// Builds a record for `key`/`value` owned by the entry at `owner`.
    ///
    /// The buffer is obtained fallibly; on failure nothing is allocated and
    /// the caller's structures are untouched.
    pub fn new(key: &[u8], value: &[u8], owner: Pos) -> Result<Self, AllocError> {
        let class = SizeClass::for_sizes(key.len(), value.len());
        let needed = class.header_len() + key.len() + value.len();
        let mut buf: Vec<u8> = Vec::new();
        buf.try_reserve_exact(needed)
            .map_err(|_| AllocError::new("item record", needed))?;
        buf.resize(needed, 0);

        let mut rec = Self {
            class,
            owner,
            data: buf.into_boxed_slice(),
        };
        rec.write_key_size(key.len());
        rec.write_val_size(value.len());
        let key_off = class.header_len();
        rec.data[key_off..key_off + key.len()].copy_from_slice(key);
        let val_off = key_off + key.len();
        rec.data[val_off..val_off + value.len()].copy_from_slice(value);
        Ok(rec)
    }

    /// The record's layout class.
    pub fn size_class(&self) -> SizeClass {
        self.class
    }

    /// Position of the entry that owns this record.
    pub fn owner(&self) -> Pos {
        self.owner
    }

    /// Key length in bytes.
    pub fn key_size(&self) -> usize {
        match self.class {
            SizeClass::Compact => usize::from(self.data[0]),
            SizeClass::Extended => {
                u32::from_le_bytes([self.data[0], self.data[1], self.data[2], self.data[3]])
                    as usize
            }
        }
    }

    /// Value length in bytes.
    pub fn val_size(&self) -> usize {
        match self.class {
            SizeClass::Compact => usize::from(self.data[1]),
            SizeClass::Extended => {
                u32::from_le_bytes([self.data[4], self.data[5], self.data[6], self.data[7]])
                    as usize
            }
        }
    }

    /// The key bytes.
    pub fn key(&self) -> &[u8] {
        let off = self.class.header_len();
        &self.data[off..off + self.key_size()]
    }

    /// The value bytes.
    pub fn value(&self) -> &[u8] {
        let off = self.class.header_len() + self.key_size();
        &self.data[off..off + self.val_size()]
    }

    /// Bytes the record currently occupies (header + key + value).
    pub fn needed(&self) -> usize {
        self.class.header_len() + self.key_size() + self.val_size()
    }

    /// Bytes allocated for the record; at least `needed()`.
    pub fn allocated(&self) -> usize {
        self.data.len()
    }

    /// Whether a value of `new_val_size` bytes may be written in place.
    ///
    /// Reuse requires the layout class to stay the same and the new required
    /// size to fall within the half-to-full window of the allocation, so a
    /// shrunk record never retains more than double what it needs.
    pub fn fits_value(&self, new_val_size: usize) -> bool {
        let key_size = self.key_size();
        if SizeClass::for_sizes(key_size, new_val_size) != self.class {
            return false;
        }
        let needed = self.class.header_len() + key_size + new_val_size;
        let have = self.data.len();
        needed <= have && needed >= have / 2
    }

    /// Rewrites the value bytes in place.
    ///
    /// The caller must hold the record exclusively and have checked
    /// [`fits_value`](Self::fits_value); violating either is a contract bug.
    pub fn set_value(&mut self, value: &[u8]) {
        debug_assert!(self.fits_value(value.len()));
        let off = self.class.header_len() + self.key_size();
        self.write_val_size(value.len());
        self.data[off..off + value.len()].copy_from_slice(value);
    }

    fn write_key_size(&mut self, key_size: usize) {
        match self.class {
            SizeClass::Compact => self.data[0] = key_size as u8,
            SizeClass::Extended => {
                self.data[0..4].copy_from_slice(&(key_size as u32).to_le_bytes())
            }
        }
    }

    fn write_val_size(&mut self, val_size: usize) {
        match self.class {
            SizeClass::Compact => self.data[1] = val_size as u8,
            SizeClass::Extended => {
                self.data[4..8].copy_from_slice(&(val_size as u32).to_le_bytes())
            }
        }
    }
}
