use bytes::Bytes;
#[cfg(test)]
use mockall::automock;

use crate::Result;

/// Byte-key/byte-value store consulted by every `/kv` request.
///
/// Implementations must tolerate concurrent calls from many requests. Each
/// call is consistent on its own; no transaction spans two calls.
#[cfg_attr(test, automock)]
pub trait KvStore: Send + Sync + 'static {
    /// Returns the stored value, or `StorageError::KeyNotFound`.
    fn get(
        &self,
        key: &[u8],
    ) -> Result<Bytes>;

    /// Inserts or overwrites `key`.
    fn put(
        &self,
        key: &[u8],
        value: Bytes,
    ) -> Result<()>;

    /// Removes `key`. Removing an absent key succeeds.
    fn delete(
        &self,
        key: &[u8],
    ) -> Result<()>;

    /// Persists buffered writes; called once on shutdown.
    fn flush(&self) -> Result<()>;
}
