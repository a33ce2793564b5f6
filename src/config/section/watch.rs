//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! enable = true       # Recompile when template files change
//! settle_ms = 100     # Wait before recompiling so editor bursts settle
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Filesystem watching settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatchConfig {
    /// Enable the filesystem watcher.
    pub enable: bool,

    /// Delay between the first relevant event and the recompilation.
    pub settle_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enable: true,
            settle_ms: 100,
        }
    }
}

impl WatchConfig {
    pub const fn disabled() -> Self {
        Self {
            enable: false,
            settle_ms: 0,
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
