//! Pluggable key hashing.
//!
//! The store never assumes a host hash function: hashing is a strategy
//! injected through [`KeyHasher`]. [`MixHasher`] is the self-contained
//! default, a byte-wise multiply/XOR accumulator; [`HasherAdapter`] bridges
//! any std [`BuildHasher`] so callers can plug in faster or keyed hashers
//! ([`FxKeyHasher`] is the `rustc-hash` shortcut).
//!
//! Cached hashes in the entry table are 32 bits wide; 64-bit hasher output
//! is truncated by the adapter.

use std::hash::{BuildHasher, BuildHasherDefault};

/// Strategy for hashing opaque byte keys down to a 32-bit value.
pub trait KeyHasher {
    /// Hashes `key` to the 32-bit value cached in the entry table.
    fn hash_key(&self, key: &[u8]) -> u32;
}

/// Default byte-wise multiply/XOR mixing hasher.
///
/// Runs two accumulators over the key and folds the length in at the end,
/// so permutations and truncations of a key hash differently. Deterministic
/// across processes, which keeps bucket layouts reproducible in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixHasher;

impl KeyHasher for MixHasher {
    fn hash_key(&self, key: &[u8]) -> u32 {
        let mut a1: u32 = 0xdead_beef;
        let mut a2: u32 = 0x71fe_feed;
        for &b in key {
            a1 = a1.wrapping_add(u32::from(b)).wrapping_mul(5);
            a2 = (a2 ^ u32::from(b)).wrapping_mul(9);
        }
        a1 ^= key.len() as u32;
        a1 = a1.wrapping_mul(5);
        a2 = a2.wrapping_mul(9);
        a1 ^ a2
    }
}

/// Adapter that turns any std [`BuildHasher`] into a [`KeyHasher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HasherAdapter<S>(S);

impl<S> HasherAdapter<S> {
    /// Wraps a `BuildHasher` for use as a key hashing strategy.
    pub fn new(build: S) -> Self {
        Self(build)
    }
}

impl<S: BuildHasher> KeyHasher for HasherAdapter<S> {
    fn hash_key(&self, key: &[u8]) -> u32 {
        self.0.hash_one(key) as u32
    }
}

/// FxHash-backed key hasher.
pub type FxKeyHasher = HasherAdapter<BuildHasherDefault<rustc_hash::FxHasher>>;
