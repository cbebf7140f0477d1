//! Capacity poller: tracks mounted drives and their free/total bytes.

use std::path::Path;

use tracing::{debug, warn};

use crate::config::Settings;
use crate::system::{DiskArbitration, IoRegistry, VolumeSpace, VolumeStats};

use super::resolver::{eligible_volume, resolve_drive};
use super::types::{Drive, DriveList};

/// Polls mounted volumes and reconciles them against the tracked drive
/// list. Invoke [`read`](Self::read) from the host scheduler; the
/// callback receives the full reconciled list at most once per poll.
#[derive(Debug)]
pub struct CapacityPoller {
    arbitration: Box<dyn DiskArbitration>,
    registry: Box<dyn IoRegistry>,
    volumes: Box<dyn VolumeStats>,
    list: DriveList,
}

#[cfg(target_os = "macos")]
impl CapacityPoller {
    /// Poller backed by the live system facilities.
    pub fn new() -> Self {
        Self::with_system(
            Box::new(crate::system::DiskArbitrationImpl),
            Box::new(crate::system::IoRegistryImpl),
            Box::new(crate::system::VolumeStatsImpl),
        )
    }
}

#[cfg(target_os = "macos")]
impl Default for CapacityPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl CapacityPoller {
    /// Poller with explicit backends; tests pass mocks here.
    pub fn with_system(
        arbitration: Box<dyn DiskArbitration>,
        registry: Box<dyn IoRegistry>,
        volumes: Box<dyn VolumeStats>,
    ) -> Self {
        Self { arbitration, registry, volumes, list: DriveList::new() }
    }

    /// Drives as of the last completed poll.
    pub fn drives(&self) -> &[Drive] {
        self.list.as_slice()
    }

    /// One poll cycle.
    ///
    /// Session or enumeration failure aborts the cycle without invoking
    /// the callback. A drive whose byte queries both fail reports zero
    /// without affecting the rest of the list.
    pub fn read(&mut self, settings: &Settings, mut callback: impl FnMut(&[Drive])) {
        let mounts = match self.arbitration.mounted_volumes() {
            Ok(mounts) => mounts,
            Err(err) => {
                warn!("capacity poll aborted, volume enumeration failed: {err}");
                return;
            }
        };
        let session = match self.arbitration.open_session() {
            Ok(session) => session,
            Err(err) => {
                warn!("capacity poll aborted, cannot open disk arbitration session: {err}");
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
                let (removable, mount) = {
                    let drive = &self.list.as_slice()[index];
                    (drive.removable, drive.path.clone())
                };
                if removable && !settings.include_removable {
                    self.list.remove(index);
                    continue;
                }
                if let Some(mount) = mount {
                    let space = query_space(self.volumes.as_ref(), &mount);
                    if let Some(drive) = self.list.get_mut(&bsd_name) {
                        drive.free = space.free;
                        drive.size = space.total;
                    }
                }
                continue;
            }

            if let Some(mut drive) = resolve_drive(
                session.as_ref(),
                self.registry.as_ref(),
                &bsd_name,
                volume,
                settings.include_removable,
            ) {
                if let Some(mount) = drive.path.clone() {
                    let space = query_space(self.volumes.as_ref(), &mount);
                    drive.free = space.free;
                    drive.size = space.total;
                }
                self.list.push(drive);
            }
        }

        // Anything tracked but no longer enumerated was unmounted.
        self.list.retain(|drive| active.iter().any(|name| *name == drive.bsd_name));

        callback(self.list.as_slice());
    }
}

/// Two-tier byte query: filesystem attributes first, resource values only
/// when the primary fails, zero when both do.
fn query_space(volumes: &dyn VolumeStats, mount: &Path) -> VolumeSpace {
    match volumes.filesystem_attributes(mount) {
        Ok(space) => space,
        Err(primary) => match volumes.resource_values(mount) {
            Ok(space) => {
                debug!(
                    "filesystem attributes failed for {}, using resource values: {primary}",
                    mount.display()
                );
                space
            }
            Err(fallback) => {
                debug!(
                    "byte queries failed for {}: {primary}; {fallback}",
                    mount.display()
                );
                VolumeSpace::default()
            }
        },
    }
}
