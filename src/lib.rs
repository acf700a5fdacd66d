//! bytekv: ordered in-memory byte key/value storage primitives.
//!
//! An embeddable container for small variable-length binary keys and values
//! with O(1) average lookup/insert/delete, an explicit caller-reorderable
//! recency list, and copy-on-write cloning. Eviction policy is left to the
//! caller; `bump_recent`/`bump_least_recent`/`pop_first` are the building
//! blocks for LRU- and MRU-style caches on top.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod ds;
pub mod error;
pub mod hash;
pub mod prelude;
pub mod store;
