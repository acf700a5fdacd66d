pub use crate::ds::{EntryIndex, ItemRecord, Pos, SizeClass};
pub use crate::error::{AllocError, InvariantError};
pub use crate::hash::{FxKeyHasher, HasherAdapter, KeyHasher, MixHasher};
#[cfg(feature = "concurrency")]
pub use crate::store::ConcurrentKvStore;
pub use crate::store::{Iter, KvStore};
