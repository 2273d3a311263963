//! Collection stores for analyses and market questions
//!
//! Stores implement the `CollectionStore` trait. `MemoryStore` keeps
//! collections in process; `SqliteStore` keeps them in a SQLite file.

mod memory;
pub mod seed;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use seed::seed_store;
pub use sqlite::SqliteStore;
pub use traits::{CollectionStore, OpenStore, StorageError, StorageResult};
