use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::store::database::{Database, Visitor};
use crate::store::error::{StoreError, StoreResult};

/// Record kept in a multi-store's root store for each child store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetaData {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
}

impl StoreMetaData {
    pub fn to_json(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| StoreError::SerializationError {
            format: "json".to_string(),
            source: Box::new(e),
        })
    }

    pub fn from_json(bytes: &[u8]) -> StoreResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::DeserializationError {
            format: "json".to_string(),
            source: Box::new(e),
        })
    }
}

/// One namespace: a name, a location and the engine it exclusively owns.
pub struct Store {
    name: String,
    path: PathBuf,
    database: Box<dyn Database>,
}

impl Store {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, database: Box<dyn Database>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            database,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Like [`Database::get`], but a missing key is an error.
    pub fn get_required(&self, key: &[u8]) -> StoreResult<Vec<u8>> {
        self.database
            .get(key)?
            .ok_or_else(|| StoreError::KeyNotFound {
                key: String::from_utf8_lossy(key).into_owned(),
            })
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("version", &self.database.version())
            .finish()
    }
}

impl Database for Store {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.database.get(key)
    }

    fn has(&self, key: &[u8]) -> StoreResult<bool> {
        self.database.has(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.database.set(key, value)
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.database.delete(key)
    }

    fn iterate(&self, visit: Visitor<'_>) -> StoreResult<bool> {
        self.database.iterate(visit)
    }

    fn iterate_range(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        ascending: bool,
        visit: Visitor<'_>,
    ) -> StoreResult<bool> {
        self.database.iterate_range(start, end, ascending, visit)
    }

    fn hash(&self) -> Vec<u8> {
        self.database.hash()
    }

    fn version(&self) -> i64 {
        self.database.version()
    }

    fn working_version(&self) -> i64 {
        self.database.working_version()
    }

    fn working_hash(&self) -> Vec<u8> {
        self.database.working_hash()
    }

    fn available_versions(&self) -> Vec<i64> {
        self.database.available_versions()
    }

    fn is_empty(&self) -> bool {
        self.database.is_empty()
    }

    fn dump(&self) -> StoreResult<String> {
        self.database.dump()
    }

    fn load(&self) -> StoreResult<i64> {
        self.database.load()
    }

    fn load_version(&self, version: i64) -> StoreResult<i64> {
        self.database.load_version(version)
    }

    fn save_version(&self) -> StoreResult<(Vec<u8>, i64)> {
        self.database.save_version()
    }

    fn rollback(&self) -> StoreResult<()> {
        self.database.rollback()
    }

    fn close(&self) -> StoreResult<()> {
        self.database.close()
    }
}
