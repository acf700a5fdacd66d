//! Error types for the bytekv library.
//!
//! ## Key Components
//!
//! - [`AllocError`]: Returned when growing the entry table, the bucket table,
//!   or an item record fails to obtain memory. The store is left in its prior
//!   valid state (table growth itself is rollback-safe).
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (debug-only `check_invariants` methods).
//!
//! Lookup misses, empty-store reads, and reorders of absent keys are normal
//! outcomes modeled with `Option`, not errors.

use std::fmt;

// ---------------------------------------------------------------------------
// AllocError
// ---------------------------------------------------------------------------

/// Error returned when an internal allocation fails.
///
/// Carries which structure was being grown and the number of bytes requested.
/// Produced by `put` / `insert_as_oldest`; every other store operation is
/// infallible given valid inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError {
    what: &'static str,
    bytes: usize,
}

impl AllocError {
    /// Creates a new `AllocError` for the named structure and request size.
    #[inline]
    pub fn new(what: &'static str, bytes: usize) -> Self {
        Self { what, bytes }
    }

    /// Returns the structure that failed to grow.
    #[inline]
    pub fn what(&self) -> &'static str {
        self.what
    }

    /// Returns the number of bytes that could not be obtained.
    #[inline]
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to allocate {} bytes for {}", self.bytes, self.what)
    }
}

impl std::error::Error for AllocError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal store invariants are violated.
///
/// Produced by debug-only `check_invariants` methods on
/// [`EntryIndex`](crate::ds::EntryIndex) and
/// [`KvStore`](crate::store::KvStore). Carries a human-readable description
/// of which invariant failed. Hot paths assert instead: a corrupt chain is a
/// programming-contract violation, not a recoverable error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
