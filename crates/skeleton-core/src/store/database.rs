use std::fmt::Debug;
use std::path::Path;

use crate::store::error::StoreResult;

/// Visitor passed to iteration methods. Returning `true` stops the iteration.
pub type Visitor<'a> = &'a mut dyn FnMut(&[u8], &[u8]) -> bool;

/// Versioned key-value engine backing a single [`Store`](crate::store::Store).
///
/// The engine keeps a mutable working set on top of the latest saved version.
/// `save_version` commits the working set as a new, hash-identified version;
/// `rollback` discards uncommitted mutations. Implementations are internally
/// synchronized and are used through shared references.
pub trait Database: Send + Sync + Debug {
    /// Value stored under `key` in the working set, `None` when absent.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Whether `key` is present in the working set.
    fn has(&self, key: &[u8]) -> StoreResult<bool>;

    /// Insert or replace a value.
    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn delete(&self, key: &[u8]) -> StoreResult<()>;

    /// Visit every pair in ascending key order. Returns `true` if the visitor stopped early.
    fn iterate(&self, visit: Visitor<'_>) -> StoreResult<bool>;

    /// Visit pairs with keys in `[start, end)`; `None` leaves a bound open.
    /// Returns `true` if the visitor stopped early.
    fn iterate_range(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        ascending: bool,
        visit: Visitor<'_>,
    ) -> StoreResult<bool>;

    /// Root hash of the latest saved version.
    fn hash(&self) -> Vec<u8>;

    /// Latest saved version, `0` when nothing has been saved.
    fn version(&self) -> i64;

    /// Version the working set will be saved as.
    fn working_version(&self) -> i64;

    /// Root hash of the current working set.
    fn working_hash(&self) -> Vec<u8>;

    /// All versions that can be passed to `load_version`, ascending.
    fn available_versions(&self) -> Vec<i64>;

    /// Whether the working set holds no keys.
    fn is_empty(&self) -> bool;

    /// Human-readable rendering of the working set.
    fn dump(&self) -> StoreResult<String>;

    /// Load the latest saved version, discarding the working set.
    fn load(&self) -> StoreResult<i64>;

    /// Load a specific saved version, discarding the working set.
    fn load_version(&self, version: i64) -> StoreResult<i64>;

    /// Commit the working set. Returns the new root hash and version.
    fn save_version(&self) -> StoreResult<(Vec<u8>, i64)>;

    /// Reset the working set to the latest saved version.
    fn rollback(&self) -> StoreResult<()>;

    /// Release the engine. Further calls fail with `StoreError::Closed`.
    fn close(&self) -> StoreResult<()>;
}

/// Materializes database engines at a filesystem location.
pub trait DatabaseFactory: Send + Sync + Debug {
    fn create_database(&self, name: &str, path: &Path) -> StoreResult<Box<dyn Database>>;
}
