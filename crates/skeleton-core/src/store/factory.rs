use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};

use crate::store::database::DatabaseFactory;
use crate::store::error::{StoreError, StoreResult};
use crate::store::kv::{Store, StoreMetaData};
use crate::store::multistore::MultiStore;
use crate::store::snapshot::{MemoryDatabaseFactory, SnapshotDatabaseFactory};
use crate::utils::hash_sha256;

/// File extension of a store's database location.
pub const STORE_EXTENSION: &str = "db";

/// Builds [`Store`]s for a multi-store.
pub trait StoreFactory: Send + Sync + Debug {
    /// Create the store for a logical name at its derived location.
    fn create_store(&self, name: &str) -> StoreResult<Arc<Store>>;

    /// Reopen a store at the location recorded in its metadata.
    fn open_store(&self, meta: &StoreMetaData) -> StoreResult<Arc<Store>>;
}

/// Store factory that places every store under one base directory.
#[derive(Debug, Clone)]
pub struct DefaultStoreFactory {
    databases_dir: PathBuf,
    db_factory: Arc<dyn DatabaseFactory>,
}

impl DefaultStoreFactory {
    pub fn new(databases_dir: impl Into<PathBuf>, db_factory: Arc<dyn DatabaseFactory>) -> Self {
        Self {
            databases_dir: databases_dir.into(),
            db_factory,
        }
    }

    /// Snapshot databases persisted under `databases_dir`.
    pub fn on_disk(databases_dir: impl Into<PathBuf>) -> Self {
        Self::new(databases_dir, Arc::new(SnapshotDatabaseFactory))
    }

    /// Databases that never touch the filesystem. Paths are still derived and recorded.
    pub fn in_memory(databases_dir: impl Into<PathBuf>) -> Self {
        Self::new(databases_dir, Arc::new(MemoryDatabaseFactory))
    }

    pub fn databases_dir(&self) -> &Path {
        &self.databases_dir
    }

    fn materialize(&self, name: &str, path: PathBuf) -> StoreResult<Arc<Store>> {
        let database = self
            .db_factory
            .create_database(name, &path)
            .map_err(|e| StoreError::StorageInit {
                name: name.to_string(),
                path: path.clone(),
                source: Box::new(e),
            })?;
        log::debug!("Materialized store '{}' at {}", name, path.display());
        Ok(Arc::new(Store::new(name, path, database)))
    }
}

impl StoreFactory for DefaultStoreFactory {
    fn create_store(&self, name: &str) -> StoreResult<Arc<Store>> {
        let (_, path) = generate_storage_info(name, &self.databases_dir);
        self.materialize(name, path)
    }

    fn open_store(&self, meta: &StoreMetaData) -> StoreResult<Arc<Store>> {
        self.materialize(&meta.name, meta.path.clone())
    }
}

/// Deterministic store id: hex SHA-256 of the logical name.
pub fn generate_store_id(name: &str) -> String {
    hash_sha256(name)
}

/// Store id and database location (`<dir>/<id>.db`) for a logical name.
pub fn generate_storage_info(name: &str, dir: &Path) -> (String, PathBuf) {
    let id = generate_store_id(name);
    let path = dir.join(format!("{}.{}", id, STORE_EXTENSION));
    (id, path)
}

/// A store name is non-empty and made only of characters in the Unicode
/// letter or number categories. Combining marks are rejected.
pub fn is_valid_store_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            matches!(
                c.general_category_group(),
                GeneralCategoryGroup::Letter | GeneralCategoryGroup::Number
            )
        })
}

/// Build a root store named `name` through `factory` and wrap it in a [`MultiStore`].
pub fn create_multi_store(name: &str, factory: Arc<dyn StoreFactory>) -> StoreResult<MultiStore> {
    if !is_valid_store_name(name) {
        return Err(StoreError::InvalidName { name: name.to_string() });
    }
    let root = factory.create_store(name)?;
    Ok(MultiStore::new(root, factory))
}
