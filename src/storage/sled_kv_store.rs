//! sled-backed [`KvStore`].
//!
//! sled serialises each tree operation internally, so no adapter-level lock
//! is taken around get/put/delete.

use bytes::Bytes;
use tracing::debug;
use tracing::error;

use super::init_sled_kv_db;
use super::KvStore;
use super::KV_TREE;
use crate::Result;
use crate::StorageConfig;
use crate::StorageError;

pub struct SledKvStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl std::fmt::Debug for SledKvStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SledKvStore").field("tree_len", &self.tree.len()).finish()
    }
}

impl SledKvStore {
    /// Opens (or creates) the store under `config.db_path`.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let db = init_sled_kv_db(&config.db_path, config).map_err(StorageError::IoError)?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self> {
        let tree = db.open_tree(KV_TREE)?;
        debug!(keys = tree.len(), "sled kv store opened");
        Ok(Self { db, tree })
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

impl KvStore for SledKvStore {
    fn get(
        &self,
        key: &[u8],
    ) -> Result<Bytes> {
        match self.tree.get(key) {
            Ok(Some(v)) => Ok(Bytes::copy_from_slice(&v)),
            Ok(None) => Err(StorageError::KeyNotFound.into()),
            Err(e) => {
                error!("kv get error: {}", e);
                Err(StorageError::from(e).into())
            }
        }
    }

    fn put(
        &self,
        key: &[u8],
        value: Bytes,
    ) -> Result<()> {
        self.tree.insert(key, value.as_ref()).map_err(|e| {
            error!("kv put error: {}", e);
            StorageError::from(e)
        })?;
        Ok(())
    }

    fn delete(
        &self,
        key: &[u8],
    ) -> Result<()> {
        self.tree.remove(key).map_err(|e| {
            error!("kv delete error: {}", e);
            StorageError::from(e)
        })?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let flushed = self.db.flush().map_err(StorageError::from)?;
        debug!(bytes = flushed, "sled kv store flushed");
        Ok(())
    }
}
