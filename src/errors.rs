//! Error hierarchy for the key-value store and its watch subsystem.
//!
//! Storage and infrastructure failures are surfaced to HTTP callers through
//! [`crate::api::ApiError`]; the watch subsystem itself never fails (a dropped
//! notification is not an error).

use std::net::SocketAddr;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Infrastructure-level failures (network binding, process signals, I/O)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration loading or merging failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration values that parsed but are not usable
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Embedded storage engine failures
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("Failed to bind server on {addr}: {reason}")]
    ServerBind { addr: SocketAddr, reason: String },

    #[error("Node start failed: {0}")]
    NodeStartFailed(String),

    #[error("Failed to send shutdown signal: {0}")]
    SignalSenderClosed(String),

    #[error("Failed to install signal handler: {0}")]
    SignalHandler(std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Read of a key that has never been written or was deleted
    #[error("Key not found")]
    KeyNotFound,

    /// Disk I/O failures underneath the engine
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Embedded database errors
    #[error("Embedded database error: {0}")]
    DbError(String),
}

impl From<sled::Error> for StorageError {
    fn from(e: sled::Error) -> Self {
        match e {
            sled::Error::Io(io) => StorageError::IoError(io),
            other => StorageError::DbError(other.to_string()),
        }
    }
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Error::Storage(e.into())
    }
}

impl Error {
    /// Whether this error reports a missing key rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Storage(StorageError::KeyNotFound))
    }
}
