pub mod kv;

#[cfg(feature = "concurrency")]
pub mod concurrent;

#[cfg(feature = "concurrency")]
pub use concurrent::ConcurrentKvStore;
pub use kv::{Iter, KvStore};
