//! Storage Interface: the byte-key/byte-value store the HTTP layer reads and
//! writes before any watcher is notified.
//!
//! Two adapters implement [`KvStore`]:
//! - [`SledKvStore`]: the embedded sled engine used by the server
//! - [`MemKvStore`]: an in-memory map for tests and embedding

mod kv_store;
mod mem_kv_store;
mod sled_kv_store;

pub use kv_store::*;
pub use mem_kv_store::*;
pub use sled_kv_store::*;


use std::path::Path;

use tracing::debug;
use tracing::warn;

use crate::StorageConfig;

/// Sled tree holding the client key space
pub(crate) const KV_TREE: &str = "kv";

/// Opens the sled database backing the key space
pub fn init_sled_kv_db(
    sled_db_root_path: impl AsRef<Path> + std::fmt::Debug,
    config: &StorageConfig,
) -> std::result::Result<sled::Db, std::io::Error> {
    debug!("init_sled_kv_db from path: {:?}", sled_db_root_path);

    let kv_db_path = sled_db_root_path.as_ref().join("kv");

    sled::Config::default()
        .path(&kv_db_path)
        .cache_capacity(config.cache_capacity_bytes())
        .flush_every_ms(config.flush_every())
        .use_compression(true)
        .compression_factor(1)
        .open()
        .map_err(|e| {
            warn!(
                "Try to open DB at this location: {:?} and failed: {:?}",
                kv_db_path, e
            );
            std::io::Error::other(e)
        })
}
