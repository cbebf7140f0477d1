use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::system::RegistryEntry;

/// Per-drive activity: the deltas reported for the last interval plus the
/// cumulative counters they were derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveActivity {
    /// Bytes read during the last poll interval.
    pub read: i64,
    /// Bytes written during the last poll interval.
    pub write: i64,
    /// Cumulative read counter as last read from the registry.
    pub bytes_read: i64,
    /// Cumulative write counter as last read from the registry.
    pub bytes_written: i64,
}

/// One storage device currently visible to the OS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Drive {
    /// BSD-style device identifier, e.g. `disk1s4`. Unique within a poll.
    pub bsd_name: String,
    /// Display name: volume name, media name, or the mount folder under
    /// `/Volumes`.
    pub media_name: String,
    /// Device model, whitespace-trimmed.
    pub model: String,
    /// Bus protocol, e.g. `PCI-Express` or `USB`.
    pub connection: String,
    /// Filesystem kind, e.g. `apfs`.
    pub file_system: String,
    /// Mount path. Always present for drives produced by resolution;
    /// optional because a drive can unmount between polls.
    pub path: Option<PathBuf>,
    /// Whether this is the boot volume mounted at `/`.
    pub root: bool,
    pub removable: bool,
    /// IO-registry ancestor used for statistics lookups. Never released;
    /// lives as long as the record.
    #[serde(skip)]
    pub parent: Option<RegistryEntry>,
    /// Free bytes, refreshed by the capacity poller.
    pub free: u64,
    /// Total bytes, refreshed by the capacity poller.
    pub size: u64,
    pub activity: DriveActivity,
}

/// Ordered collection of drives, keyed by device identifier and kept
/// sorted by it so results are deterministic across polls.
#[derive(Debug, Clone, Default)]
pub struct DriveList {
    drives: Vec<Drive>,
}

impl DriveList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.drives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drives.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Drive> {
        self.drives.iter()
    }

    pub fn as_slice(&self) -> &[Drive] {
        &self.drives
    }

    /// Index of the drive with this identifier.
    pub fn position(&self, bsd_name: &str) -> Option<usize> {
        self.drives.iter().position(|drive| drive.bsd_name == bsd_name)
    }

    pub fn contains(&self, bsd_name: &str) -> bool {
        self.position(bsd_name).is_some()
    }

    pub fn get_mut(&mut self, bsd_name: &str) -> Option<&mut Drive> {
        self.drives.iter_mut().find(|drive| drive.bsd_name == bsd_name)
    }

    /// Append a drive and restore identifier order. The sort is stable,
    /// so equal keys keep their insertion order.
    pub fn push(&mut self, drive: Drive) {
        self.drives.push(drive);
        self.drives.sort_by(|a, b| a.bsd_name.cmp(&b.bsd_name));
    }

    pub fn remove(&mut self, index: usize) -> Drive {
        self.drives.remove(index)
    }

    pub fn retain(&mut self, keep: impl FnMut(&Drive) -> bool) {
        self.drives.retain(keep);
    }
}

impl<'a> IntoIterator for &'a DriveList {
    type Item = &'a Drive;
    type IntoIter = std::slice::Iter<'a, Drive>;

    fn into_iter(self) -> Self::IntoIter {
        self.drives.iter()
    }
}
