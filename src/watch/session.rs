//! One watch request's lifetime: register, wait for exactly one outcome, release.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::WatchEvent;
use super::WatchRegistry;
use super::WatchTarget;
use super::WatcherHandle;
use crate::metrics::WATCH_OUTCOMES;

/// Lifecycle of a [`WatchSession`]. Every state but `Registered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Registered,
    Delivered,
    TimedOut,
    Disconnected,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Registered => "registered",
            SessionState::Delivered => "delivered",
            SessionState::TimedOut => "timed_out",
            SessionState::Disconnected => "disconnected",
        }
    }
}

/// The single result a watch session reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// A change arrived; a deletion arrives as a `Delete` event
    Delivered(WatchEvent),
    /// The wait interval elapsed with nothing delivered ("no change")
    TimedOut,
    /// The caller went away, or the server is shutting down
    Disconnected,
}

impl WatchOutcome {
    pub fn state(&self) -> SessionState {
        match self {
            WatchOutcome::Delivered(_) => SessionState::Delivered,
            WatchOutcome::TimedOut => SessionState::TimedOut,
            WatchOutcome::Disconnected => SessionState::Disconnected,
        }
    }
}

/// A registered watch waiting for delivery, timeout or disconnect.
///
/// The session exclusively owns its registration. Whichever way it ends,
/// including the session future being dropped mid-wait when an HTTP client
/// hangs up, the registration is removed and its channel closed once.
#[derive(Debug)]
pub struct WatchSession {
    handle: WatcherHandle,
    timeout: Duration,
    state: SessionState,
}

impl WatchSession {
    /// Registers with `registry`; the session starts in `Registered`.
    pub fn open(
        registry: &WatchRegistry,
        target: WatchTarget,
        timeout: Duration,
    ) -> Self {
        let handle = registry.register(target);
        debug!(watcher_id = handle.id(), target = ?handle.target(), ?timeout, "watch registered");
        Self {
            handle,
            timeout,
            state: SessionState::Registered,
        }
    }

    pub fn watcher_id(&self) -> u64 {
        self.handle.id()
    }

    pub fn target(&self) -> &WatchTarget {
        self.handle.target()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Waits for the first of: a delivered change, the timeout, or `cancel`.
    ///
    /// A closed delivery channel (registry torn down) also counts as a
    /// disconnect.
    pub async fn wait(
        mut self,
        cancel: CancellationToken,
    ) -> WatchOutcome {
        let timeout = self.timeout;

        let outcome = tokio::select! {
            biased;
            event = self.handle.receiver_mut().recv() => match event {
                Some(event) => WatchOutcome::Delivered(event),
                None => WatchOutcome::Disconnected,
            },
            _ = tokio::time::sleep(timeout) => WatchOutcome::TimedOut,
            _ = cancel.cancelled() => WatchOutcome::Disconnected,
        };

        self.finish(outcome.state());
        outcome
    }

    fn finish(
        &mut self,
        state: SessionState,
    ) {
        self.state = state;
        let released = self.handle.cancel();
        WATCH_OUTCOMES.with_label_values(&[state.as_str()]).inc();
        debug!(
            watcher_id = self.handle.id(),
            outcome = state.as_str(),
            released,
            "watch finished"
        );
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        // Dropped while still waiting: the caller abandoned the request.
        if self.state == SessionState::Registered {
            self.finish(SessionState::Disconnected);
        }
    }
}
