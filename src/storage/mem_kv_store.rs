use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::trace;

use super::KvStore;
use crate::Result;
use crate::StorageError;

/// In-memory [`KvStore`].
///
/// Reads take the shared lock, writes the exclusive one, each for the span of
/// a single operation.
#[derive(Default, Debug)]
pub struct MemKvStore {
    data: RwLock<HashMap<Vec<u8>, Bytes>>,
}

impl MemKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl KvStore for MemKvStore {
    fn get(
        &self,
        key: &[u8],
    ) -> Result<Bytes> {
        self.data
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::KeyNotFound.into())
    }

    fn put(
        &self,
        key: &[u8],
        value: Bytes,
    ) -> Result<()> {
        trace!(key = ?key, len = value.len(), "mem put");
        self.data.write().insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(
        &self,
        key: &[u8],
    ) -> Result<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
