use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::store::database::{Database, DatabaseFactory, Visitor};
use crate::store::error::{StoreError, StoreResult};
use crate::utils::fs::{list_files, write_atomic};

type Tree = BTreeMap<Vec<u8>, Vec<u8>>;

const SNAPSHOT_PREFIX: &str = "v";
const SNAPSHOT_EXTENSION: &str = ".json";

/// Root hash of a tree: SHA-256 over the length-prefixed, key-ordered pairs.
pub fn root_hash(tree: &BTreeMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for (key, value) in tree {
        hasher.update((key.len() as u64).to_be_bytes());
        hasher.update(key);
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value);
    }
    hasher.finalize().to_vec()
}

/// On-disk form of one saved version
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: i64,
    hash: String,
    /// Hex encoded key/value pairs in key order
    entries: Vec<(String, String)>,
}

/// Where saved versions live
#[derive(Debug)]
enum Backend {
    Memory(BTreeMap<i64, Arc<Tree>>),
    Disk(PathBuf),
}

impl Backend {
    fn versions(&self) -> StoreResult<Vec<i64>> {
        match self {
            Backend::Memory(history) => Ok(history.keys().copied().collect()),
            Backend::Disk(dir) => {
                let files = list_files(dir, |name| parse_snapshot_version(name).is_some())
                    .map_err(|e| StoreError::io(e, "read_dir", dir.clone()))?;
                let mut versions: Vec<i64> = files
                    .iter()
                    .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
                    .filter_map(parse_snapshot_version)
                    .collect();
                versions.sort_unstable();
                Ok(versions)
            }
        }
    }

    fn read(&self, version: i64) -> StoreResult<Arc<Tree>> {
        match self {
            Backend::Memory(history) => history
                .get(&version)
                .cloned()
                .ok_or(StoreError::VersionNotFound { version }),
            Backend::Disk(dir) => {
                let path = snapshot_path(dir, version);
                if !path.is_file() {
                    return Err(StoreError::VersionNotFound { version });
                }
                let raw = fs::read_to_string(&path)
                    .map_err(|e| StoreError::io(e, "read_snapshot", path.clone()))?;
                let file: SnapshotFile =
                    serde_json::from_str(&raw).map_err(|e| StoreError::DeserializationError {
                        format: "json".to_string(),
                        source: Box::new(e),
                    })?;
                if file.version != version {
                    return Err(StoreError::Corrupted {
                        path,
                        reason: format!("expected version {}, found {}", version, file.version),
                    });
                }

                let mut tree = Tree::new();
                for (key, value) in &file.entries {
                    let decode = |s: &str| {
                        hex::decode(s).map_err(|e| StoreError::Corrupted {
                            path: path.clone(),
                            reason: e.to_string(),
                        })
                    };
                    tree.insert(decode(key)?, decode(value)?);
                }
                if hex::encode(root_hash(&tree)) != file.hash {
                    return Err(StoreError::Corrupted {
                        path,
                        reason: "root hash mismatch".to_string(),
                    });
                }
                Ok(Arc::new(tree))
            }
        }
    }

    fn write(&mut self, version: i64, tree: &Arc<Tree>, hash: &[u8]) -> StoreResult<()> {
        match self {
            Backend::Memory(history) => {
                history.insert(version, Arc::clone(tree));
                Ok(())
            }
            Backend::Disk(dir) => {
                let file = SnapshotFile {
                    version,
                    hash: hex::encode(hash),
                    entries: tree
                        .iter()
                        .map(|(key, value)| (hex::encode(key), hex::encode(value)))
                        .collect(),
                };
                let bytes = serde_json::to_vec_pretty(&file).map_err(|e| {
                    StoreError::SerializationError {
                        format: "json".to_string(),
                        source: Box::new(e),
                    }
                })?;
                let path = snapshot_path(dir, version);
                write_atomic(&path, &bytes).map_err(|e| StoreError::io(e, "write_snapshot", path))
            }
        }
    }
}

fn snapshot_path(dir: &Path, version: i64) -> PathBuf {
    dir.join(format!("{}{}{}", SNAPSHOT_PREFIX, version, SNAPSHOT_EXTENSION))
}

fn parse_snapshot_version(file_name: &str) -> Option<i64> {
    file_name
        .strip_prefix(SNAPSHOT_PREFIX)?
        .strip_suffix(SNAPSHOT_EXTENSION)?
        .parse()
        .ok()
}

struct State {
    working: Tree,
    saved: Arc<Tree>,
    saved_hash: Vec<u8>,
    version: i64,
    closed: bool,
    backend: Backend,
}

impl State {
    fn apply(&mut self, version: i64, tree: Arc<Tree>) {
        self.saved_hash = root_hash(&tree);
        self.working = (*tree).clone();
        self.saved = tree;
        self.version = version;
    }
}

/// Versioned key-value engine that commits whole-tree snapshots.
///
/// The working set is an ordered map. Each saved version is kept either in
/// memory ([`SnapshotDatabase::in_memory`]) or as `v<N>.json` inside the
/// database directory ([`SnapshotDatabase::open`]), written atomically.
pub struct SnapshotDatabase {
    name: String,
    state: RwLock<State>,
}

impl SnapshotDatabase {
    /// Create a database whose versions live only in memory.
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self::with_backend(name.into(), Backend::Memory(BTreeMap::new()))
    }

    /// Open (or create) a database in `dir` and load its latest saved version.
    pub fn open(name: impl Into<String>, dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(e, "create_dir_all", dir.clone()))?;
        let database = Self::with_backend(name.into(), Backend::Disk(dir));
        database.load()?;
        Ok(database)
    }

    fn with_backend(name: String, backend: Backend) -> Self {
        let empty = Arc::new(Tree::new());
        Self {
            name,
            state: RwLock::new(State {
                working: Tree::new(),
                saved_hash: root_hash(&empty),
                saved: empty,
                version: 0,
                closed: false,
                backend,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // Poisoning is recovered; the state holds plain values.
    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn open_state(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        let state = self.read_state();
        if state.closed {
            return Err(StoreError::Closed { name: self.name.clone() });
        }
        Ok(state)
    }

    fn open_state_mut(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        let state = self.write_state();
        if state.closed {
            return Err(StoreError::Closed { name: self.name.clone() });
        }
        Ok(state)
    }
}

impl fmt::Debug for SnapshotDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("SnapshotDatabase")
            .field("name", &self.name)
            .field("version", &state.version)
            .field("keys", &state.working.len())
            .field("backend", &state.backend)
            .finish()
    }
}

impl Database for SnapshotDatabase {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.open_state()?.working.get(key).cloned())
    }

    fn has(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.open_state()?.working.contains_key(key))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.open_state_mut()?.working.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.open_state_mut()?.working.remove(key);
        Ok(())
    }

    fn iterate(&self, visit: Visitor<'_>) -> StoreResult<bool> {
        let state = self.open_state()?;
        for (key, value) in &state.working {
            if visit(key, value) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn iterate_range(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        ascending: bool,
        visit: Visitor<'_>,
    ) -> StoreResult<bool> {
        let state = self.open_state()?;
        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                return Ok(false);
            }
        }

        let lower = start.map_or(Bound::Unbounded, Bound::Included);
        let upper = end.map_or(Bound::Unbounded, Bound::Excluded);
        let range = state.working.range::<[u8], _>((lower, upper));

        let mut visit_pair =
            |(key, value): (&Vec<u8>, &Vec<u8>)| visit(key.as_slice(), value.as_slice());
        let stopped = if ascending {
            range.into_iter().any(&mut visit_pair)
        } else {
            range.into_iter().rev().any(&mut visit_pair)
        };
        Ok(stopped)
    }

    fn hash(&self) -> Vec<u8> {
        self.read_state().saved_hash.clone()
    }

    fn version(&self) -> i64 {
        self.read_state().version
    }

    fn working_version(&self) -> i64 {
        self.read_state().version + 1
    }

    fn working_hash(&self) -> Vec<u8> {
        root_hash(&self.read_state().working)
    }

    fn available_versions(&self) -> Vec<i64> {
        match self.read_state().backend.versions() {
            Ok(versions) => versions,
            Err(e) => {
                log::warn!("Could not list versions of database '{}': {}", self.name, e);
                Vec::new()
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.read_state().working.is_empty()
    }

    fn dump(&self) -> StoreResult<String> {
        let state = self.open_state()?;
        let mut out = format!("{} (version {})\n", self.name, state.version);
        for (key, value) in &state.working {
            out.push_str(&format!(
                "  {} = {}\n",
                String::from_utf8_lossy(key),
                String::from_utf8_lossy(value)
            ));
        }
        Ok(out)
    }

    fn load(&self) -> StoreResult<i64> {
        let mut state = self.open_state_mut()?;
        let latest = state.backend.versions()?.last().copied();
        match latest {
            Some(version) => {
                let tree = state.backend.read(version)?;
                state.apply(version, tree);
            }
            None => state.apply(0, Arc::new(Tree::new())),
        }
        log::debug!("Loaded database '{}' at version {}", self.name, state.version);
        Ok(state.version)
    }

    fn load_version(&self, version: i64) -> StoreResult<i64> {
        let mut state = self.open_state_mut()?;
        let tree = if version == 0 {
            Arc::new(Tree::new())
        } else {
            state.backend.read(version)?
        };
        state.apply(version, tree);
        Ok(version)
    }

    fn save_version(&self) -> StoreResult<(Vec<u8>, i64)> {
        let mut state = self.open_state_mut()?;
        let version = state.version + 1;
        let tree = Arc::new(state.working.clone());
        let hash = root_hash(&tree);

        // Saving on top of an older loaded version must not rewrite history.
        if state.backend.versions()?.contains(&version) {
            let existing = state.backend.read(version)?;
            if root_hash(&existing) != hash {
                return Err(StoreError::VersionExists { version });
            }
        }

        state.backend.write(version, &tree, &hash)?;
        state.saved = tree;
        state.saved_hash = hash.clone();
        state.version = version;
        log::debug!("Saved database '{}' version {}", self.name, version);
        Ok((hash, version))
    }

    fn rollback(&self) -> StoreResult<()> {
        let mut state = self.open_state_mut()?;
        let saved = Arc::clone(&state.saved);
        state.working = (*saved).clone();
        Ok(())
    }

    fn close(&self) -> StoreResult<()> {
        let mut state = self.open_state_mut()?;
        state.closed = true;
        state.working.clear();
        Ok(())
    }
}

/// Creates [`SnapshotDatabase`]s persisted under the requested path.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapshotDatabaseFactory;

impl DatabaseFactory for SnapshotDatabaseFactory {
    fn create_database(&self, name: &str, path: &Path) -> StoreResult<Box<dyn Database>> {
        Ok(Box::new(SnapshotDatabase::open(name, path)?))
    }
}

/// Creates in-memory [`SnapshotDatabase`]s; the path is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryDatabaseFactory;

impl DatabaseFactory for MemoryDatabaseFactory {
    fn create_database(&self, name: &str, _path: &Path) -> StoreResult<Box<dyn Database>> {
        Ok(Box::new(SnapshotDatabase::in_memory(name)))
    }
}
