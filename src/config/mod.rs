//! Configuration management for the key-value node.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`WATCHKV__SECTION__FIELD`)
//! - Component-wise validation
//!
//! Configuration is fixed at process start.
mod auth;
mod monitoring;
mod server;
mod storage;
mod watch;
pub use auth::*;
pub use monitoring::*;
pub use server::*;
pub use storage::*;
pub use watch::*;


use std::env;
use std::path::Path;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Prefix for environment variable overrides, e.g. `WATCHKV__AUTH__TOKEN`.
pub const ENV_PREFIX: &str = "WATCHKV";

/// Main configuration container for the node
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct KvNodeConfig {
    /// HTTP listener and log settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Embedded storage engine settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Bearer token gate
    #[serde(default)]
    pub auth: AuthConfig,
    /// Watch timeout and delivery buffer
    #[serde(default)]
    pub watch: WatchConfig,
    /// Prometheus endpoint
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

impl KvNodeConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `WATCHKV__` prefix (highest priority)
    ///
    /// # Note
    /// Validation is deferred so that `with_override_config()` can still be
    /// applied. Callers MUST call `validate()` before using the configuration.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("WATCHKV__AUTH__TOKEN", "secret");
    /// let cfg = KvNodeConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` from the first failing subsystem.
    pub fn validate(self) -> Result<Self> {
        self.server.validate()?;
        self.storage.validate()?;
        self.auth.validate()?;
        self.watch.validate()?;
        self.monitoring.validate(self.server.listen_address.port())?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

/// Ensures directory path is valid and writable
pub(super) fn validate_directory(
    path: &Path,
    name: &str,
) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidConfig(format!("{name} path cannot be empty")));
    }

    #[cfg(not(test))]
    {
        use std::fs;
        if !path.exists() {
            fs::create_dir_all(path).map_err(|e| {
                Error::InvalidConfig(format!(
                    "Failed to create {} directory at {}: {}",
                    name,
                    path.display(),
                    e
                ))
            })?;
        }

        let test_file = path.join(".permission_test");
        fs::write(&test_file, b"test").map_err(|e| {
            Error::InvalidConfig(format!(
                "No write permission in {} directory {}: {}",
                name,
                path.display(),
                e
            ))
        })?;
        fs::remove_file(&test_file).ok();
    }

    Ok(())
}
