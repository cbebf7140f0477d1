//! Activity poller: per-drive read/write rates from IO-registry counters.

use std::time::Duration;

use tracing::warn;

use crate::config::Settings;
use crate::system::{DiskArbitration, IoRegistry};

use super::constants::ACTIVITY_POLL_INTERVAL;
use super::resolver::{eligible_volume, resolve_drive};
use super::types::{Drive, DriveList};

/// Polls the statistics dictionary of every tracked drive's driver entry
/// and derives read/write rates as deltas between consecutive polls.
///
/// Keeps its own drive list, reconciled against the mounted volumes the
/// same way the capacity poller does; a drive only yields rates once it
/// has been observed on an earlier poll.
#[derive(Debug)]
pub struct ActivityPoller {
    arbitration: Box<dyn DiskArbitration>,
    registry: Box<dyn IoRegistry>,
    list: DriveList,
}

#[cfg(target_os = "macos")]
impl ActivityPoller {
    /// Poller backed by the live system facilities.
    pub fn new() -> Self {
        Self::with_system(
            Box::new(crate::system::DiskArbitrationImpl),
            Box::new(crate::system::IoRegistryImpl),
        )
    }
}

#[cfg(target_os = "macos")]
impl Default for ActivityPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityPoller {
    /// Poller with explicit backends; tests pass mocks here.
    pub fn with_system(
        arbitration: Box<dyn DiskArbitration>,
        registry: Box<dyn IoRegistry>,
    ) -> Self {
        Self { arbitration, registry, list: DriveList::new() }
    }

    /// The fixed cadence this poller is meant to run at.
    pub const fn interval() -> Duration {
        ACTIVITY_POLL_INTERVAL
    }

    /// Drives as of the last completed poll.
    pub fn drives(&self) -> &[Drive] {
        self.list.as_slice()
    }

    /// One poll cycle. Session or enumeration failure aborts the cycle
    /// without invoking the callback.
    pub fn read(&mut self, settings: &Settings, mut callback: impl FnMut(&[Drive])) {
        let mounts = match self.arbitration.mounted_volumes() {
            Ok(mounts) => mounts,
            Err(err) => {
                warn!("activity poll aborted, volume enumeration failed: {err}");
                return;
            }
        };
        let session = match self.arbitration.open_session() {
            Ok(session) => session,
            Err(err) => {
                warn!("activity poll aborted, cannot open disk arbitration session: {err}");
                return;
            }
        };

        let mut active: Vec<String> = Vec::new();
        for volume in mounts.iter().filter(|path| eligible_volume(path)) {
            let Some(bsd_name) = session.device_identifier(volume) else {
                continue;
            };
            active.push(bsd_name.clone());

            if let Some(index) = self.list.position(&bsd_name) {
                if self.list.as_slice()[index].removable && !settings.include_removable {
                    self.list.remove(index);
                    continue;
                }
                if let Some(drive) = self.list.get_mut(&bsd_name) {
                    update_stats(self.registry.as_ref(), drive);
                }
                continue;
            }

            if let Some(drive) = resolve_drive(
                session.as_ref(),
                self.registry.as_ref(),
                &bsd_name,
                volume,
                settings.include_removable,
            ) {
                self.list.push(drive);
            }
        }

        self.list.retain(|drive| active.iter().any(|name| *name == drive.bsd_name));

        callback(self.list.as_slice());
    }
}

/// Pull the driver's cumulative counters and fold them into the drive.
///
/// Rates are only derived while the stored cumulative for that counter is
/// nonzero, so the first observation primes the baseline instead of
/// reporting the whole lifetime total as one interval's traffic. Counter
/// regressions (e.g. a driver reset) surface as negative rates.
fn update_stats(registry: &dyn IoRegistry, drive: &mut Drive) {
    let Some(parent) = drive.parent else {
        return;
    };
    let Some(stats) = registry.statistics(parent) else {
        return;
    };

    if drive.activity.bytes_read != 0 {
        drive.activity.read = stats.bytes_read - drive.activity.bytes_read;
    }
    if drive.activity.bytes_written != 0 {
        drive.activity.write = stats.bytes_written - drive.activity.bytes_written;
    }

    drive.activity.bytes_read = stats.bytes_read;
    drive.activity.bytes_written = stats.bytes_written;
}
