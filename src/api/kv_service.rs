//! The operations behind the HTTP routes.
//!
//! Mutations are applied to storage first and only then offered to watchers,
//! so a watcher never hears about a write that storage rejected.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::KvStore;
use crate::Result;
use crate::WatchConfig;
use crate::WatchDispatcher;
use crate::WatchOutcome;
use crate::WatchRegistry;
use crate::WatchSession;
use crate::WatchTarget;

#[derive(Clone)]
pub struct KvService {
    store: Arc<dyn KvStore>,
    dispatcher: WatchDispatcher,
    watch_timeout: Duration,
    /// Cancelled on server shutdown; ends every in-flight watch
    shutdown: CancellationToken,
}

impl std::fmt::Debug for KvService {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("KvService")
            .field("watch_timeout", &self.watch_timeout)
            .field("watched_targets", &self.registry().watched_target_count())
            .finish_non_exhaustive()
    }
}

impl KvService {
    pub fn new(
        store: Arc<dyn KvStore>,
        registry: WatchRegistry,
        watch_config: &WatchConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            dispatcher: WatchDispatcher::new(registry),
            watch_timeout: watch_config.timeout(),
            shutdown,
        }
    }

    pub fn registry(&self) -> &WatchRegistry {
        self.dispatcher.registry()
    }

    pub fn get(
        &self,
        key: &[u8],
    ) -> Result<Bytes> {
        self.store.get(key)
    }

    /// Stores `value`, then notifies watchers of `key`.
    pub fn put(
        &self,
        key: Bytes,
        value: Bytes,
    ) -> Result<()> {
        self.store.put(&key, value.clone())?;
        let delivered = self.dispatcher.notify_put(key, value);
        debug!(delivered, "put applied");
        Ok(())
    }

    /// Deletes `key`, then notifies watchers with the deletion marker.
    pub fn delete(
        &self,
        key: Bytes,
    ) -> Result<()> {
        self.store.delete(&key)?;
        let delivered = self.dispatcher.notify_delete(key);
        debug!(delivered, "delete applied");
        Ok(())
    }

    /// Registers a watch on `target` and waits for its single outcome.
    pub async fn watch(
        &self,
        target: WatchTarget,
    ) -> WatchOutcome {
        WatchSession::open(self.registry(), target, self.watch_timeout)
            .wait(self.shutdown.clone())
            .await
    }
}
