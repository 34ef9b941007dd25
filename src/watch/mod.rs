//! Watch mechanism: block a request until a key changes.
//!
//! A watch request registers interest in one key (or one key prefix) and then
//! waits for the first of three things: a change is delivered, the wait
//! interval elapses, or the client goes away. Writers notify watchers after
//! the storage layer has accepted the write.
//!
//! # Architecture Overview
//!
//! ```text
//! PUT/DELETE /kv/{key}                      GET /watch/{key}
//!        │                                         │
//!        │ 1. KvStore::put/delete                  │ WatchSession::open()
//!        ▼                                         ▼
//! ┌──────────────────┐  2. notify()   ┌──────────────────────┐
//! │  WatchDispatcher │ ─────────────▶ │    WatchRegistry     │
//! └──────────────────┘   lookup       │ target -> {id: tx}   │
//!        │                            └──────────────────────┘
//!        │ try_send (never blocks)               ▲
//!        ▼                                       │ cancel on drop
//! ┌──────────────────┐                ┌──────────────────────┐
//! │ per-watcher mpsc │ ─────────────▶ │ WatchSession::wait() │
//! │ (bounded)        │   recv         │ delivery | timeout | │
//! └──────────────────┘                │ disconnect           │
//!                                     └──────────────────────┘
//! ```
//!
//! # Delivery Guarantees
//!
//! Delivery is best-effort and in-memory only:
//!
//! - A notification is offered to each matching watcher with `try_send`. If
//!   the watcher's channel is full (it already holds an undelivered event) or
//!   closed, the notification is **dropped** for that watcher.
//! - A watcher registered after `notify` ran does not see that write.
//! - There is no event log and no revision; a missed change is
//!   indistinguishable from no change and is resolved by the timeout.
//!
//! A slow or absent watcher therefore never stalls a writer.
//!
//! # Ownership
//!
//! The session owns its [`WatcherHandle`]. The registry only holds the sending
//! half of the delivery channel. Removing that sender closes the channel, and
//! the handle removes it exactly once, when the session terminates or is
//! dropped. The registry never ends a session on its own.

mod dispatcher;
mod registry;
mod session;

#[cfg(test)]
mod dispatcher_test;

pub use dispatcher::*;
pub use registry::*;
pub use session::*;

use bytes::Bytes;

/// Event type for watch notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventType {
    /// Key was inserted or updated
    Put,
    /// Key was deleted; the deletion marker
    Delete,
}

impl WatchEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchEventType::Put => "put",
            WatchEventType::Delete => "delete",
        }
    }
}

/// A single key change, as delivered to watchers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// The key that changed
    pub key: Bytes,
    /// The new value (empty for DELETE events)
    pub value: Bytes,
    /// Type of change
    pub event_type: WatchEventType,
}

impl WatchEvent {
    pub fn put(
        key: Bytes,
        value: Bytes,
    ) -> Self {
        Self {
            key,
            value,
            event_type: WatchEventType::Put,
        }
    }

    pub fn delete(key: Bytes) -> Self {
        Self {
            key,
            value: Bytes::new(),
            event_type: WatchEventType::Delete,
        }
    }

    pub fn is_delete(&self) -> bool {
        self.event_type == WatchEventType::Delete
    }
}

/// What a watch request is interested in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchTarget {
    /// Exactly this key (byte-for-byte)
    Key(Bytes),
    /// Every key starting with these bytes
    Prefix(Bytes),
}

impl WatchTarget {
    pub fn matches(
        &self,
        key: &[u8],
    ) -> bool {
        match self {
            WatchTarget::Key(k) => k.as_ref() == key,
            WatchTarget::Prefix(p) => key.starts_with(p),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        match self {
            WatchTarget::Key(b) | WatchTarget::Prefix(b) => b,
        }
    }
}
