pub mod error;
pub mod file;
pub mod id;
pub mod memory;
pub mod slot;
pub mod store;

pub use error::{Result, StoreError};
pub use file::FileSlot;
pub use id::{generator_for, IdGenerator, TimestampIds, UuidIds};
pub use memory::MemorySlot;
pub use slot::SlotStorage;
pub use store::{ReviewStore, StoreOptions};
