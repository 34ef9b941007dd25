//! # watchkv
//!
//! A networked key-value store whose clients can block on a key until it
//! changes.
//!
//! Writes go through [`KvStore`] (sled on disk by default); every accepted
//! write is then offered to the watchers registered for that key (or a prefix
//! of it). A watcher waits for one change, a timeout, or its own disconnect.
//!
//! ## Quick start
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
//! let node = NodeBuilder::new(None, shutdown_rx)?.build()?.ready()?;
//! node.run().await?;
//! ```

pub mod api;
mod config;
mod errors;
pub mod metrics;
mod node;
mod storage;
pub mod utils;
mod watch;

pub use config::*;
pub use errors::*;
pub use node::*;
pub use storage::*;
pub use watch::*;
