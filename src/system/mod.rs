//! Trait facades over the OS storage facilities.
//!
//! Everything the pollers ask of macOS goes through the traits in this
//! module: volume enumeration and disk-arbitration sessions, IO-registry
//! traversal and statistics, filesystem byte queries, and process
//! listing/usage. The pollers themselves are platform-independent; only
//! the `macos` backend behind these traits touches FFI.
//!
//! Mockall mocks (`MockDiskArbitration`, `MockArbitrationSession`,
//! `MockIoRegistry`, `MockVolumeStats`, `MockProcessSource`) are generated
//! for every trait and ship with the crate, so hosts and the crate's own
//! integration tests can drive the pollers without a Mac.
//!
//! # Sessions
//!
//! Disk-arbitration sessions are per-poll-cycle resources: a poller opens
//! one at the start of `read()`, resolves every volume through it, and
//! drops it before returning. Failure to open a session is the one error
//! that aborts a whole device poll.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use mockall::automock;

use crate::error::Result;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::{DiskArbitrationImpl, IoRegistryImpl, ProcessSourceImpl, VolumeStatsImpl};

/// Opaque handle to an IO-registry entry.
///
/// On macOS this wraps a raw `io_registry_entry_t`; mocks use arbitrary
/// values. The handle is only ever passed back to the [`IoRegistry`] that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryEntry(u64);

impl RegistryEntry {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Description of a resolved device, as reported by disk arbitration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceDescription {
    pub removable: bool,
    pub volume_name: Option<String>,
    pub media_name: Option<String>,
    pub model: Option<String>,
    pub protocol: Option<String>,
    pub volume_kind: Option<String>,
    pub volume_path: Option<PathBuf>,
    /// IO-registry entry for the device's media object, the starting point
    /// of the parent walk.
    pub media_entry: Option<RegistryEntry>,
}

/// Cumulative byte counters from a registry entry's statistics dictionary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveStatistics {
    pub bytes_read: i64,
    pub bytes_written: i64,
}

/// Free/total byte counts for one mounted filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeSpace {
    pub free: u64,
    pub total: u64,
}

/// Cumulative disk I/O counters for one process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessUsage {
    pub bytes_read: i64,
    pub bytes_written: i64,
}

/// Volume enumeration and session creation.
#[automock]
pub trait DiskArbitration: Debug + Send + Sync {
    /// Paths of all currently mounted filesystems.
    fn mounted_volumes(&self) -> Result<Vec<PathBuf>>;

    /// Open a disk-arbitration session for one poll cycle.
    fn open_session(&self) -> Result<Box<dyn ArbitrationSession>>;
}

/// One disk-arbitration session, resolving mount paths to devices.
#[automock]
pub trait ArbitrationSession: Debug {
    /// BSD-style device identifier for the volume, e.g. `disk1s4`.
    /// `None` when the path resolves to no device.
    fn device_identifier(&self, volume: &Path) -> Option<String>;

    /// Full device description for the volume. `None` when the device
    /// exposes no description dictionary.
    fn describe(&self, volume: &Path) -> Option<DeviceDescription>;
}

/// IO-registry traversal and per-entry statistics.
#[automock]
pub trait IoRegistry: Debug + Send + Sync {
    /// Immediate parent of a registry entry, or `None` at the root or on
    /// lookup failure.
    fn parent(&self, entry: RegistryEntry) -> Option<RegistryEntry>;

    /// The entry's "Statistics" property dictionary, reduced to its byte
    /// counters. `None` when the entry has no readable statistics;
    /// counters missing from an otherwise present dictionary read as 0.
    fn statistics(&self, entry: RegistryEntry) -> Option<DriveStatistics>;
}

/// Two independent sources of free/total byte counts per mount path.
#[automock]
pub trait VolumeStats: Debug + Send + Sync {
    /// Primary source: the filesystem-attributes query.
    fn filesystem_attributes(&self, mount: &Path) -> Result<VolumeSpace>;

    /// Fallback source: the resource-value query on the mount URL. A
    /// reported total of zero is treated as a failed query.
    fn resource_values(&self, mount: &Path) -> Result<VolumeSpace>;
}

/// Process listing and per-pid disk usage.
#[automock]
pub trait ProcessSource: Debug + Send + Sync {
    /// Raw line-oriented output of the process-listing tool, one process
    /// per line. An error means the tool itself failed to run.
    fn list_output(&self) -> Result<String>;

    /// Cumulative disk I/O for a pid. `None` when the query fails,
    /// typically because the process exited after being listed.
    fn disk_usage(&self, pid: i32) -> Option<ProcessUsage>;
}
