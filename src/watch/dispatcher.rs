//! Notification fan-out from the write path to registered watchers.

use bytes::Bytes;
use tokio::sync::mpsc::error::TrySendError;
use tracing::trace;

use super::WatchEvent;
use super::WatchRegistry;
use crate::metrics::DROPPED_NOTIFICATIONS;

/// Delivers key changes to every watcher currently registered for them.
///
/// Called inline by the mutation handlers after storage accepted the write.
/// It never blocks and never fails: a watcher that cannot take the event
/// right now simply misses it.
#[derive(Debug, Clone)]
pub struct WatchDispatcher {
    registry: WatchRegistry,
}

impl WatchDispatcher {
    pub fn new(registry: WatchRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    /// Notify watchers of a PUT event (insert or update)
    pub fn notify_put(
        &self,
        key: Bytes,
        value: Bytes,
    ) -> usize {
        self.notify(WatchEvent::put(key, value))
    }

    /// Notify watchers of a DELETE event
    pub fn notify_delete(
        &self,
        key: Bytes,
    ) -> usize {
        self.notify(WatchEvent::delete(key))
    }

    /// Offers `event` to every matching watcher.
    ///
    /// Returns how many watchers accepted it. Watchers whose channel is full
    /// or already closed are skipped.
    pub fn notify(
        &self,
        event: WatchEvent,
    ) -> usize {
        let mut delivered = 0;
        let mut dropped = 0;

        self.registry.for_each_matching(&event.key, |watcher_id, sender| {
            match sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    trace!(watcher_id, "watcher busy, notification dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    trace!(watcher_id, "watcher already gone");
                }
            }
        });

        if dropped > 0 {
            DROPPED_NOTIFICATIONS.inc_by(dropped);
        }
        if delivered > 0 || dropped > 0 {
            trace!(
                key = ?event.key,
                event_type = ?event.event_type,
                delivered,
                dropped,
                "Event dispatched"
            );
        }
        delivered
    }
}
