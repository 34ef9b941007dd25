use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Watch subsystem configuration
///
/// - `timeout_ms`: how long a watch request waits before answering "no change"
/// - `watcher_buffer_size`: slots in each registration's delivery channel. A
///   notification that finds the channel full is dropped, so with the default
///   of one slot a registration is satisfied by at most one delivery.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_watcher_buffer_size")]
    pub watcher_buffer_size: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            watcher_buffer_size: default_watcher_buffer_size(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(Error::InvalidConfig("watch.timeout_ms must be > 0".into()));
        }
        if self.watcher_buffer_size == 0 {
            return Err(Error::InvalidConfig(
                "watch.watcher_buffer_size must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}
fn default_watcher_buffer_size() -> usize {
    1
}
