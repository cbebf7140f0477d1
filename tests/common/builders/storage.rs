use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use darwin_storage::system::{
    DeviceDescription, DriveStatistics, MockArbitrationSession, MockDiskArbitration,
    MockIoRegistry, MockProcessSource, MockVolumeStats, ProcessUsage, RegistryEntry, VolumeSpace,
};

/// One mounted volume as the mocked system presents it: the enumerated
/// mount path, the device identifier it resolves to, and the description
/// an arbitration session reports for it.
#[derive(Debug, Clone)]
pub struct TestVolume {
    pub mount: PathBuf,
    pub bsd_name: String,
    pub description: DeviceDescription,
}

/// Creates a fixed internal volume with a full description.
pub fn test_volume(mount: &str, bsd_name: &str, name: &str) -> TestVolume {
    TestVolume {
        mount: PathBuf::from(mount),
        bsd_name: bsd_name.to_string(),
        description: DeviceDescription {
            removable: false,
            volume_name: Some(name.to_string()),
            media_name: Some(name.to_string()),
            model: Some("APPLE SSD AP0512Q".to_string()),
            protocol: Some("Apple Fabric".to_string()),
            volume_kind: Some("apfs".to_string()),
            volume_path: Some(PathBuf::from(mount)),
            media_entry: None,
        },
    }
}

/// Creates a USB-attached removable volume.
pub fn removable_test_volume(mount: &str, bsd_name: &str, name: &str) -> TestVolume {
    let mut volume = test_volume(mount, bsd_name, name);
    volume.description.removable = true;
    volume.description.protocol = Some("USB".to_string());
    volume
}

/// Shared volume table; tests mutate it between polls to simulate mounts
/// and ejects.
pub type VolumeTable = Arc<Mutex<Vec<TestVolume>>>;

pub fn volume_table(volumes: Vec<TestVolume>) -> VolumeTable {
    Arc::new(Mutex::new(volumes))
}

/// Arbitration mock that enumerates and resolves whatever the table
/// currently holds.
pub fn arbitration_over(table: VolumeTable) -> MockDiskArbitration {
    let mut arbitration = MockDiskArbitration::new();

    let mounts = table.clone();
    arbitration
        .expect_mounted_volumes()
        .returning(move || Ok(mounts.lock().iter().map(|v| v.mount.clone()).collect()));

    arbitration.expect_open_session().returning(move || {
        let mut session = MockArbitrationSession::new();

        let lookup = table.clone();
        session.expect_device_identifier().returning(move |path: &Path| {
            lookup
                .lock()
                .iter()
                .find(|v| v.mount.as_path() == path)
                .map(|v| v.bsd_name.clone())
        });

        let lookup = table.clone();
        session.expect_describe().returning(move |path: &Path| {
            lookup
                .lock()
                .iter()
                .find(|v| v.mount.as_path() == path)
                .map(|v| v.description.clone())
        });

        Ok(Box::new(session))
    });

    arbitration
}

/// Registry mock over a fixed parent chain and a mutable per-entry
/// statistics table.
pub fn registry_with_chain(
    parents: HashMap<u64, u64>,
    stats: Arc<Mutex<HashMap<u64, DriveStatistics>>>,
) -> MockIoRegistry {
    let mut registry = MockIoRegistry::new();
    registry.expect_parent().returning(move |entry| {
        parents.get(&entry.raw()).map(|raw| RegistryEntry::from_raw(*raw))
    });
    registry
        .expect_statistics()
        .returning(move |entry| stats.lock().get(&entry.raw()).copied());
    registry
}

/// Volume-stats mock reporting the same space for every mount.
pub fn volume_stats_fixed(free: u64, total: u64) -> MockVolumeStats {
    let mut stats = MockVolumeStats::new();
    stats
        .expect_filesystem_attributes()
        .returning(move |_| Ok(VolumeSpace { free, total }));
    stats
}

/// Shared per-pid usage counters; tests mutate entries between polls.
pub type UsageTable = Arc<Mutex<HashMap<i32, ProcessUsage>>>;

pub fn usage_table(entries: Vec<(i32, ProcessUsage)>) -> UsageTable {
    Arc::new(Mutex::new(entries.into_iter().collect()))
}

/// Process-source mock over a fixed listing and the shared usage table.
/// A pid missing from the table fails its usage query, like a process
/// that exited after being listed.
pub fn process_source_over(listing: &str, usage: UsageTable) -> MockProcessSource {
    let mut source = MockProcessSource::new();
    let text = listing.to_string();
    source.expect_list_output().returning(move || Ok(text.clone()));
    source
        .expect_disk_usage()
        .returning(move |pid| usage.lock().get(&pid).copied());
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_defaults() {
        let volume = test_volume("/", "disk1s1", "Macintosh HD");

        assert_eq!(volume.mount, PathBuf::from("/"));
        assert_eq!(volume.bsd_name, "disk1s1");
        assert!(!volume.description.removable);
        assert_eq!(volume.description.volume_name.as_deref(), Some("Macintosh HD"));
        assert_eq!(volume.description.volume_path, Some(PathBuf::from("/")));
    }

    #[test]
    fn test_removable_volume_marks_protocol() {
        let volume = removable_test_volume("/Volumes/USB", "disk4s1", "USB");

        assert!(volume.description.removable);
        assert_eq!(volume.description.protocol.as_deref(), Some("USB"));
    }

    #[test]
    fn test_arbitration_resolves_table_entries() {
        use darwin_storage::system::{ArbitrationSession, DiskArbitration};

        let table = volume_table(vec![test_volume("/", "disk1s1", "Macintosh HD")]);
        let arbitration = arbitration_over(table);

        let mounts = arbitration.mounted_volumes().unwrap();
        assert_eq!(mounts, vec![PathBuf::from("/")]);

        let session: Box<dyn ArbitrationSession> = arbitration.open_session().unwrap();
        assert_eq!(session.device_identifier(Path::new("/")), Some("disk1s1".to_string()));
        assert_eq!(session.device_identifier(Path::new("/Volumes/None")), None);
    }
}
