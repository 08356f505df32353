//! Persistence layer
//!
//! MongoDB in production, an in-memory store for dev mode and tests. Both
//! sit behind [`RecordStore`].

mod memory;
pub mod mongo;
pub mod schemas;
pub mod store;

pub use memory::MemoryStore;
pub use mongo::{IntoIndexes, MongoClient, MongoCollection};
pub use store::{Filter, Record, RecordStore, Sort, StoreBackend, Stores};
