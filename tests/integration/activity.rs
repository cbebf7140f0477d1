use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use darwin_storage::config::Settings;
use darwin_storage::disk::{ActivityPoller, Drive};
use darwin_storage::system::{DriveStatistics, RegistryEntry};

use crate::common::{arbitration_over, registry_with_chain, test_volume, volume_table, TestVolume};

type StatsTable = Arc<Mutex<HashMap<u64, DriveStatistics>>>;

fn counters(read: i64, write: i64) -> DriveStatistics {
    DriveStatistics { bytes_read: read, bytes_written: write }
}

/// Single-digit identifiers walk one registry level, so media entry N
/// resolves to driver entry N+1.
fn parented_volume(mount: &str, bsd_name: &str, name: &str, media: u64) -> TestVolume {
    let mut volume = test_volume(mount, bsd_name, name);
    volume.description.media_entry = Some(RegistryEntry::from_raw(media));
    volume
}

fn poll(poller: &mut ActivityPoller, settings: &Settings) -> Vec<Drive> {
    let mut result = Vec::new();
    poller.read(settings, |drives| result = drives.to_vec());
    result
}

#[test]
fn test_rates_tracked_per_drive() {
    let table = volume_table(vec![
        parented_volume("/", "disk0", "Macintosh HD", 10),
        parented_volume("/Volumes/Data", "disk2", "Data", 20),
    ]);
    let stats: StatsTable = Arc::new(Mutex::new(HashMap::from([
        (11, counters(1000, 1000)),
        (21, counters(500, 500)),
    ])));
    let parents = HashMap::from([(10, 11), (20, 21)]);
    let mut poller = ActivityPoller::with_system(
        Box::new(arbitration_over(table)),
        Box::new(registry_with_chain(parents, stats.clone())),
    );
    let settings = Settings::default();

    // Discovery, then baseline priming.
    poll(&mut poller, &settings);
    poll(&mut poller, &settings);

    stats.lock().insert(11, counters(1600, 1000));
    stats.lock().insert(21, counters(500, 900));

    let drives = poll(&mut poller, &settings);
    assert_eq!(drives.len(), 2);
    assert_eq!(drives[0].bsd_name, "disk0");
    assert_eq!(drives[0].activity.read, 600);
    assert_eq!(drives[0].activity.write, 0);
    assert_eq!(drives[1].bsd_name, "disk2");
    assert_eq!(drives[1].activity.read, 0);
    assert_eq!(drives[1].activity.write, 400);
}

#[test]
fn test_new_mount_does_not_disturb_established_rates() {
    let table = volume_table(vec![parented_volume("/", "disk0", "Macintosh HD", 10)]);
    let stats: StatsTable = Arc::new(Mutex::new(HashMap::from([(11, counters(1000, 0))])));
    let parents = HashMap::from([(10, 11), (20, 21)]);
    let mut poller = ActivityPoller::with_system(
        Box::new(arbitration_over(table.clone())),
        Box::new(registry_with_chain(parents, stats.clone())),
    );
    let settings = Settings::default();

    poll(&mut poller, &settings);
    poll(&mut poller, &settings);

    // A new volume shows up while the root drive keeps moving bytes.
    table.lock().push(parented_volume("/Volumes/Data", "disk2", "Data", 20));
    stats.lock().insert(11, counters(1400, 0));
    stats.lock().insert(21, counters(9000, 9000));

    let drives = poll(&mut poller, &settings);
    assert_eq!(drives.len(), 2);
    assert_eq!(drives[0].activity.read, 400, "existing baseline unaffected");
    assert_eq!(drives[1].activity.read, 0, "fresh drive has no baseline yet");
    assert_eq!(drives[1].activity.bytes_read, 0, "counters unread on discovery");
}
