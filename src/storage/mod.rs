//! Metadata cache persistence.
//!
//! [`KeyValueStore`] is the storage seam; [`MemoryStore`] keeps a bounded LRU
//! map and [`Database`] a SQLite table. [`MetadataCache`] layers the
//! `podcast:{uuid}` JSON records on top of either.

mod cache;
mod schema;
mod store;
mod types;

pub use cache::{CachedSource, MetadataCache};
pub use schema::Database;
pub use store::{KeyValueStore, MemoryStore, DEFAULT_MEMORY_CAPACITY};
pub use types::DatabaseError;
