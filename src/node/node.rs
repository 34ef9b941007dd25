//! The running key-value node.
//!
//! ## Key Responsibilities
//! - Serves the HTTP routes on the configured listener
//! - Ends every in-flight watch when the shutdown signal fires
//! - Flushes storage once the listener has drained
//!
//! ## Example Usage
//! ```ignore
//! let node = NodeBuilder::init(config, shutdown_rx).build()?.ready()?;
//! node.run().await?;
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::warn;
use warp::Filter;
use warp::Reply;

use crate::api;
use crate::api::KvService;
use crate::KvNodeConfig;
use crate::KvStore;
use crate::Result;
use crate::SystemError;
use crate::WatchRegistry;

pub struct Node {
    pub(crate) node_config: Arc<KvNodeConfig>,
    pub(crate) service: KvService,
    pub(crate) store: Arc<dyn KvStore>,
    /// Cancelled once the shutdown signal is observed
    pub(crate) watch_shutdown: CancellationToken,
    pub(crate) shutdown_signal: watch::Receiver<()>,
    pub(crate) ready: AtomicBool,
}

impl std::fmt::Debug for Node {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("listen_address", &self.node_config.server.listen_address)
            .field("ready", &self.server_is_ready())
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl Node {
    pub fn config(&self) -> &KvNodeConfig {
        &self.node_config
    }

    pub fn service(&self) -> &KvService {
        &self.service
    }

    pub fn registry(&self) -> &WatchRegistry {
        self.service.registry()
    }

    /// Every HTTP route of the node, ready for `warp::serve` or `warp::test`.
    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
        api::routes(
            self.service.clone(),
            &self.node_config.auth,
            self.node_config.server.max_body_bytes,
        )
    }

    /// Binds the HTTP listener on `addr`.
    ///
    /// The returned future serves until the shutdown signal fires (or its
    /// sender is dropped). At that point all waiting watches are answered
    /// with 204 so the listener can drain.
    pub fn bind(
        &self,
        addr: SocketAddr,
    ) -> Result<(SocketAddr, impl Future<Output = ()> + Send + 'static)> {
        let mut shutdown_signal = self.shutdown_signal.clone();
        let watch_shutdown = self.watch_shutdown.clone();

        warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(addr, async move {
                let _ = shutdown_signal.changed().await;
                info!("shutdown signal received, releasing watches");
                watch_shutdown.cancel();
            })
            .map_err(|e| {
                SystemError::ServerBind {
                    addr,
                    reason: e.to_string(),
                }
                .into()
            })
    }

    /// Serves on `server.listen_address` until shutdown, then tears down.
    pub async fn run(&self) -> Result<()> {
        let (addr, server) = self.bind(self.node_config.server.listen_address)?;
        info!(%addr, "watchkv listening");
        self.set_ready(true);

        server.await;

        self.set_ready(false);
        self.teardown()
    }

    /// Releases every watch still registered and flushes storage.
    pub fn teardown(&self) -> Result<()> {
        self.watch_shutdown.cancel();
        let released = self.registry().clear();
        if released > 0 {
            warn!(released, "watch registrations still present at teardown");
        }
        self.store.flush()?;
        info!("node stopped");
        Ok(())
    }

    pub fn set_ready(
        &self,
        is_ready: bool,
    ) {
        self.ready.store(is_ready, Ordering::SeqCst);
    }

    pub fn server_is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
