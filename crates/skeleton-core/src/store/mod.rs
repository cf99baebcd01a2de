//! Versioned, namespaced key-value storage.
//!
//! [`Database`] is the engine contract, [`SnapshotDatabase`] the engine that
//! ships with the crate. A [`Store`] wraps one engine for one namespace and a
//! [`MultiStore`] groups many stores under a root store holding their metadata.
pub mod database;
pub mod error;
pub mod factory;
pub mod kv;
pub mod multistore;
pub mod snapshot;

pub use database::{Database, DatabaseFactory, Visitor};
pub use error::{StoreError, StoreResult};
pub use factory::{
    DefaultStoreFactory, StoreFactory, create_multi_store, generate_storage_info,
    generate_store_id, is_valid_store_name,
};
pub use kv::{Store, StoreMetaData};
pub use multistore::{LoadIssue, LoadReport, MultiStore};
pub use snapshot::{MemoryDatabaseFactory, SnapshotDatabase, SnapshotDatabaseFactory, root_hash};
