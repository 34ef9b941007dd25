//! Watch registry: which delivery channels are waiting on which key.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::trace;

use super::WatchEvent;
use super::WatchTarget;
use crate::metrics::ACTIVE_WATCHERS;

type Watchers = HashMap<u64, mpsc::Sender<WatchEvent>>;

/// Internal state of WatchRegistry
#[derive(Debug)]
struct RegistryInner {
    /// Exact-key registrations. A key with no watchers has no entry.
    exact: DashMap<Bytes, Watchers>,

    /// Prefix registrations, same invariant as `exact`
    prefixes: DashMap<Bytes, Watchers>,

    /// Next watcher ID (monotonically increasing)
    next_id: AtomicU64,

    /// Capacity of each delivery channel
    buffer_size: usize,
}

impl RegistryInner {
    fn table(
        &self,
        target: &WatchTarget,
    ) -> &DashMap<Bytes, Watchers> {
        match target {
            WatchTarget::Key(_) => &self.exact,
            WatchTarget::Prefix(_) => &self.prefixes,
        }
    }

    /// Removes one registration, dropping (and so closing) its sender.
    ///
    /// The emptiness check and the entry removal happen under the same shard
    /// lock, so a concurrent `register` can't be lost between them.
    fn remove(
        &self,
        target: &WatchTarget,
        watcher_id: u64,
    ) -> bool {
        let mut removed = false;
        self.table(target).remove_if_mut(target.bytes(), |_key, watchers| {
            removed = watchers.remove(&watcher_id).is_some();
            watchers.is_empty()
        });
        if removed {
            ACTIVE_WATCHERS.dec();
        }
        removed
    }
}

/// Registry of pending watchers, keyed by [`WatchTarget`].
///
/// Cloning is cheap and every clone shares the same registrations.
/// Registration and cancellation lock only the shard holding the target, so
/// traffic on different keys proceeds in parallel.
#[derive(Debug, Clone)]
pub struct WatchRegistry {
    inner: Arc<RegistryInner>,
}

impl WatchRegistry {
    /// `buffer_size` is the number of undelivered events a registration may
    /// hold before further notifications to it are dropped.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                exact: DashMap::new(),
                prefixes: DashMap::new(),
                next_id: AtomicU64::new(1),
                buffer_size: buffer_size.max(1),
            }),
        }
    }

    /// Register a new watcher for `target`
    ///
    /// The returned handle owns the receiving half of the delivery channel and
    /// unregisters the watcher when it is cancelled or dropped.
    pub fn register(
        &self,
        target: WatchTarget,
    ) -> WatcherHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.inner.buffer_size);

        self.inner
            .table(&target)
            .entry(target.bytes().clone())
            .or_default()
            .insert(id, sender);
        ACTIVE_WATCHERS.inc();

        trace!(watcher_id = id, target = ?target, "Watcher registered");

        WatcherHandle {
            id,
            target,
            receiver,
            registry: self.inner.clone(),
            cancelled: false,
        }
    }

    /// Removes the registration `(target, watcher_id)` and closes its channel.
    ///
    /// Returns `false` (and does nothing) if it was already removed.
    pub fn cancel(
        &self,
        target: &WatchTarget,
        watcher_id: u64,
    ) -> bool {
        self.inner.remove(target, watcher_id)
    }

    /// Calls `f` with every registration interested in `key`.
    ///
    /// Runs under shared shard locks; `f` must not call back into the registry.
    pub(crate) fn for_each_matching<F>(
        &self,
        key: &[u8],
        mut f: F,
    ) where
        F: FnMut(u64, &mpsc::Sender<WatchEvent>),
    {
        if let Some(watchers) = self.inner.exact.get(key) {
            for (id, sender) in watchers.iter() {
                f(*id, sender);
            }
        }

        if self.inner.prefixes.is_empty() {
            return;
        }
        for entry in self.inner.prefixes.iter() {
            if key.starts_with(entry.key()) {
                for (id, sender) in entry.value().iter() {
                    f(*id, sender);
                }
            }
        }
    }

    /// Drops every registration, closing all delivery channels.
    ///
    /// Waiting sessions observe the closed channel and end as disconnected.
    pub fn clear(&self) -> usize {
        let mut closed = 0;
        for table in [&self.inner.exact, &self.inner.prefixes] {
            table.retain(|_key, watchers| {
                closed += watchers.len();
                false
            });
        }
        ACTIVE_WATCHERS.sub(closed as i64);
        closed
    }

    /// Number of active watchers for `target`
    pub fn watcher_count(
        &self,
        target: &WatchTarget,
    ) -> usize {
        self.inner.table(target).get(target.bytes()).map(|w| w.len()).unwrap_or(0)
    }

    /// Number of distinct keys and prefixes currently watched
    pub fn watched_target_count(&self) -> usize {
        self.inner.exact.len() + self.inner.prefixes.len()
    }
}

/// Handle for a registered watcher
///
/// Owned by exactly one watch session. Dropping the handle unregisters the
/// watcher, so every way a session can end releases its registration.
pub struct WatcherHandle {
    id: u64,
    target: WatchTarget,
    receiver: mpsc::Receiver<WatchEvent>,
    registry: Arc<RegistryInner>,
    cancelled: bool,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

impl WatcherHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    pub fn receiver_mut(&mut self) -> &mut mpsc::Receiver<WatchEvent> {
        &mut self.receiver
    }

    /// Unregisters the watcher. Only the first call has an effect.
    ///
    /// Returns whether this call removed the registration.
    pub fn cancel(&mut self) -> bool {
        if self.cancelled {
            return false;
        }
        self.cancelled = true;
        self.registry.remove(&self.target, self.id)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        if self.cancel() {
            trace!(watcher_id = self.id, target = ?self.target, "Watcher unregistered");
        }
    }
}
