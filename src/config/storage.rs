use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::validate_directory;
use crate::Error;
use crate::Result;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Largest cache sled is allowed to reserve (1 TiB).
pub const MAX_CACHE_CAPACITY_MB: u64 = 1024 * 1024;

/// Settings handed to the embedded sled engine
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_cache_capacity_mb")]
    pub cache_capacity_mb: u64,

    /// Background flush interval; `0` leaves flushing to explicit calls
    #[serde(default = "default_flush_every_ms")]
    pub flush_every_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_capacity_mb: default_cache_capacity_mb(),
            flush_every_ms: default_flush_every_ms(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity_mb == 0 {
            return Err(Error::InvalidConfig("cache_capacity_mb must be > 0".into()));
        }
        if self.cache_capacity_mb > MAX_CACHE_CAPACITY_MB {
            return Err(Error::InvalidConfig(format!(
                "cache_capacity_mb {} exceeds the {MAX_CACHE_CAPACITY_MB} MB ceiling",
                self.cache_capacity_mb
            )));
        }
        validate_directory(&self.db_path, "db_path")
    }

    pub fn cache_capacity_bytes(&self) -> u64 {
        self.cache_capacity_mb.saturating_mul(BYTES_PER_MB)
    }

    pub fn flush_every(&self) -> Option<u64> {
        (self.flush_every_ms > 0).then_some(self.flush_every_ms)
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/watchkv")
}
fn default_cache_capacity_mb() -> u64 {
    10
}
fn default_flush_every_ms() -> u64 {
    3
}
