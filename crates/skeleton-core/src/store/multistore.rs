use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::store::database::Database;
use crate::store::error::{StoreError, StoreResult};
use crate::store::factory::{StoreFactory, generate_store_id, is_valid_store_name};
use crate::store::kv::{Store, StoreMetaData};

/// Root record that stopped a [`MultiStore::load_with_report`] pass.
#[derive(Debug)]
pub struct LoadIssue {
    /// Key of the record in the root store
    pub key: String,
    pub error: StoreError,
}

/// Outcome of [`MultiStore::load_with_report`].
#[derive(Debug)]
pub struct LoadReport {
    /// Root store version that was loaded
    pub version: i64,
    /// Child stores reopened before the pass ended
    pub loaded: usize,
    /// The record that ended the pass early, if any
    pub aborted_at: Option<LoadIssue>,
}

/// A store of stores.
///
/// Child stores are keyed by id (see [`generate_store_id`]). The root store
/// holds one [`StoreMetaData`] record per child, written by
/// [`MultiStore::save_version`] and read back by [`MultiStore::load`].
pub struct MultiStore {
    root: Arc<Store>,
    stores: RwLock<HashMap<String, Arc<Store>>>,
    factory: Arc<dyn StoreFactory>,
}

impl MultiStore {
    pub fn new(root: Arc<Store>, factory: Arc<dyn StoreFactory>) -> Self {
        Self {
            root,
            stores: RwLock::new(HashMap::new()),
            factory,
        }
    }

    pub fn root(&self) -> &Arc<Store> {
        &self.root
    }

    pub fn factory(&self) -> &Arc<dyn StoreFactory> {
        &self.factory
    }

    fn read_stores(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Store>>> {
        self.stores.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_stores(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Store>>> {
        self.stores.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get or create the store for `namespace`. The flag is `true` only when
    /// this call created it.
    ///
    /// The root store's own name is rejected: a child under it would share
    /// the root's database.
    pub fn create_store(&self, namespace: &str) -> StoreResult<(Arc<Store>, bool)> {
        let id = generate_store_id(namespace);
        if !is_valid_store_name(namespace) || id == generate_store_id(self.root.name()) {
            return Err(StoreError::InvalidName {
                name: namespace.to_string(),
            });
        }

        if let Some(store) = self.read_stores().get(&id) {
            return Ok((Arc::clone(store), false));
        }

        let mut stores = self.write_stores();
        if let Some(store) = stores.get(&id) {
            return Ok((Arc::clone(store), false));
        }
        let store = self.factory.create_store(namespace)?;
        stores.insert(id, Arc::clone(&store));
        log::info!("Created store '{}'", namespace);
        Ok((store, true))
    }

    /// Look up a child store by id. `None` when absent.
    pub fn get_store(&self, id: &str) -> Option<Arc<Store>> {
        self.read_stores().get(id).cloned()
    }

    /// Look up a child store by its logical name.
    pub fn get_store_by_name(&self, namespace: &str) -> Option<Arc<Store>> {
        self.get_store(&generate_store_id(namespace))
    }

    pub fn get_store_count(&self) -> usize {
        self.read_stores().len()
    }

    /// Ids of all child stores, sorted.
    pub fn store_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read_stores().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Rebuild the child map from the root store's latest version.
    ///
    /// A record that cannot be decoded or reopened ends the pass early
    /// without an error; stores reopened before it stay registered. Use
    /// [`MultiStore::load_with_report`] to find out whether that happened.
    pub fn load(&self) -> StoreResult<i64> {
        Ok(self.load_with_report()?.version)
    }

    pub fn load_with_report(&self) -> StoreResult<LoadReport> {
        let mut stores = self.write_stores();
        stores.clear();

        let version = self.root.load()?;
        let mut aborted_at = None;
        self.root.iterate(&mut |key, value| {
            let key = String::from_utf8_lossy(key).into_owned();
            let reopened =
                StoreMetaData::from_json(value).and_then(|meta| self.factory.open_store(&meta));
            match reopened {
                Ok(store) => {
                    stores.insert(key, store);
                    false
                }
                Err(error) => {
                    aborted_at = Some(LoadIssue { key, error });
                    true
                }
            }
        })?;

        if let Some(issue) = &aborted_at {
            log::warn!(
                "Stopped loading child stores at record '{}': {}",
                issue.key,
                issue.error
            );
        }
        log::debug!("Loaded {} child stores at root version {}", stores.len(), version);

        Ok(LoadReport {
            version,
            loaded: stores.len(),
            aborted_at,
        })
    }

    /// Record every child store in the root store, then commit the root.
    ///
    /// Child stores keep their own versions; only their metadata is written here.
    pub fn save_version(&self) -> StoreResult<(Vec<u8>, i64)> {
        {
            let stores = self.read_stores();
            for (id, store) in stores.iter() {
                let meta = StoreMetaData {
                    id: id.clone(),
                    name: store.name().to_string(),
                    path: store.path().to_path_buf(),
                };
                self.root.set(id.as_bytes(), &meta.to_json()?)?;
            }
        }
        self.root.save_version()
    }
}

impl fmt::Debug for MultiStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiStore")
            .field("root", &self.root)
            .field("stores", &self.get_store_count())
            .finish()
    }
}
