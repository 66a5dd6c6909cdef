pub mod file;
pub mod memory;
pub mod types;

pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::types::{CacheStore, CachedList, SlotSummary, StoreError};
