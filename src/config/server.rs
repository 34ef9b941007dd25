use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::validate_directory;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_address: SocketAddr,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Largest accepted `PUT /kv/{key}` body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_addr(),
            log_dir: default_log_dir(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Validates listener and log settings
    /// # Errors
    /// Returns `Error::InvalidConfig` if any configuration rules are violated
    pub fn validate(&self) -> Result<()> {
        if self.listen_address.port() == 0 {
            return Err(Error::InvalidConfig(
                "listen_address must specify a non-zero port".into(),
            ));
        }

        if self.max_body_bytes == 0 {
            return Err(Error::InvalidConfig("max_body_bytes must be > 0".into()));
        }

        validate_directory(&self.log_dir, "log_dir")?;

        Ok(())
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("/tmp/watchkv/logs")
}
fn default_max_body_bytes() -> u64 {
    4 * 1024 * 1024
}
