//! Poller settings.
//!
//! The host owns these values (typically persisted in its preference
//! store) and passes them to every `read()` call, so a toggle takes
//! effect on the next poll without any poller-side caching.

use serde::{Deserialize, Serialize};

/// Default number of processes reported by the process I/O poller.
pub const DEFAULT_TOP_PROCESSES: usize = 5;

/// Host-controlled settings shared by the storage pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Track removable drives (USB sticks, external disks) in addition to
    /// internal ones.
    #[serde(default)]
    pub include_removable: bool,

    /// Number of entries the process I/O poller reports. `0` disables
    /// that poller entirely: no listing, no callback.
    #[serde(default = "default_top_processes")]
    pub top_processes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self { include_removable: false, top_processes: DEFAULT_TOP_PROCESSES }
    }
}

fn default_top_processes() -> usize {
    DEFAULT_TOP_PROCESSES
}
