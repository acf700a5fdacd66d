pub mod entry_index;
pub mod item;

pub use entry_index::{EntryIndex, OrderIter, Pos};
pub use item::{ItemRecord, SizeClass, COMPACT_FIELD_MAX};
