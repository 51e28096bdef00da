//! The append-only backing store that holds spectrum signal arrays outside
//! of process memory, and the typed array slots that address it.
mod array;
mod store;

pub use array::StoredArray;
pub use store::{ArrayStorage, MemoryMapStore, StorageHandle};
