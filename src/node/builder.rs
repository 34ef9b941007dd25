//! A builder for assembling a [`Node`] from its configuration.
//!
//! The [`NodeBuilder`] wires the storage engine, the watch registry and the
//! HTTP service together.
//!
//! ## Key Design Points
//! - **Default Components**: a sled-backed [`SledKvStore`] opened from
//!   `storage.db_path` unless a store is supplied.
//! - **Customization**: [`NodeBuilder::store`] swaps in any [`KvStore`], e.g. the in-memory one
//!   used by tests.
//! - **Lifecycle Management**:
//!   - `build()`: Assembles the [`Node`].
//!   - `start_metrics_server()`: Launches the Prometheus endpoint when enabled.
//!   - `ready()`: Returns the assembled [`Node`].
//!
//! ## Example
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = watch::channel(());
//! let node = NodeBuilder::init(node_config, shutdown_rx)
//!     .build()?
//!     .start_metrics_server(shutdown_tx.subscribe())
//!     .ready()?;
//! node.run().await?;
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;

use crate::api::KvService;
use crate::metrics;
use crate::KvNodeConfig;
use crate::KvStore;
use crate::Node;
use crate::Result;
use crate::SledKvStore;
use crate::SystemError;
use crate::WatchRegistry;

pub struct NodeBuilder {
    pub(super) node_config: KvNodeConfig,
    pub(super) store: Option<Arc<dyn KvStore>>,
    pub(super) shutdown_signal: watch::Receiver<()>,

    pub(super) node: Option<Arc<Node>>,
}

impl NodeBuilder {
    /// Loads and validates configuration, then prepares a builder.
    ///
    /// # Arguments
    /// * `override_path` - Optional config file layered over `CONFIG_PATH`
    /// * `shutdown_signal` - Watch channel for graceful shutdown signaling
    pub fn new(
        override_path: Option<&str>,
        shutdown_signal: watch::Receiver<()>,
    ) -> Result<Self> {
        let mut node_config = KvNodeConfig::new()?;
        if let Some(p) = override_path {
            info!("with_override_config from: {}", p);
            node_config = node_config.with_override_config(p)?;
        }
        Ok(Self::init(node_config.validate()?, shutdown_signal))
    }

    /// Constructs a builder from an already validated configuration.
    pub fn init(
        node_config: KvNodeConfig,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        Self {
            node_config,
            store: None,
            shutdown_signal,
            node: None,
        }
    }

    pub fn config(&self) -> &KvNodeConfig {
        &self.node_config
    }

    /// Sets a custom storage engine
    pub fn store(
        mut self,
        store: Arc<dyn KvStore>,
    ) -> Self {
        self.store = Some(store);
        self
    }

    /// Replaces the entire node configuration
    pub fn node_config(
        mut self,
        node_config: KvNodeConfig,
    ) -> Self {
        self.node_config = node_config;
        self
    }

    /// Assembles the node.
    ///
    /// Opens the sled store under `storage.db_path` when no store was set.
    ///
    /// # Errors
    /// Storage errors from opening the database.
    pub fn build(mut self) -> Result<Self> {
        let node_config = Arc::new(self.node_config.clone());

        let store = match self.store.take() {
            Some(store) => store,
            None => {
                debug!(path = ?node_config.storage.db_path, "opening default sled store");
                Arc::new(SledKvStore::open(&node_config.storage)?) as Arc<dyn KvStore>
            }
        };

        let registry = WatchRegistry::new(node_config.watch.watcher_buffer_size);
        let watch_shutdown = CancellationToken::new();
        let service = KvService::new(
            store.clone(),
            registry,
            &node_config.watch,
            watch_shutdown.clone(),
        );

        self.node = Some(Arc::new(Node {
            node_config,
            service,
            store,
            watch_shutdown,
            shutdown_signal: self.shutdown_signal.clone(),
            ready: AtomicBool::new(false),
        }));
        Ok(self)
    }

    /// Starts the Prometheus endpoint when `monitoring.prometheus_enabled`.
    pub fn start_metrics_server(
        self,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        if !self.node_config.monitoring.prometheus_enabled {
            debug!("prometheus endpoint disabled");
            return self;
        }
        let port = self.node_config.monitoring.prometheus_port;
        tokio::spawn(async move {
            metrics::start_server(port, shutdown_signal).await;
        });
        self
    }

    /// Returns the built node instance.
    ///
    /// # Errors
    /// `SystemError::NodeStartFailed` if `build()` has not run.
    pub fn ready(self) -> Result<Arc<Node>> {
        self.node
            .ok_or_else(|| SystemError::NodeStartFailed("check node ready failed".to_string()).into())
    }
}
