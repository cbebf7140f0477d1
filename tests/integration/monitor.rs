use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use darwin_storage::config::Settings;
use darwin_storage::disk::{ActivityPoller, CapacityPoller};
use darwin_storage::monitor::{StorageMonitor, StorageUpdate};
use darwin_storage::process::ProcessPoller;
use darwin_storage::system::ProcessUsage;

use crate::common::{
    arbitration_over, process_source_over, registry_with_chain, test_volume, usage_table,
    volume_stats_fixed, volume_table,
};

#[tokio::test]
async fn test_monitor_over_mocked_system() {
    let volumes = volume_table(vec![test_volume("/", "disk1s1", "Macintosh HD")]);
    let registry = || {
        registry_with_chain(HashMap::new(), Arc::new(Mutex::new(HashMap::new())))
    };
    let usages = usage_table(vec![(1, ProcessUsage::default())]);

    let capacity = CapacityPoller::with_system(
        Box::new(arbitration_over(volumes.clone())),
        Box::new(registry()),
        Box::new(volume_stats_fixed(100, 400)),
    );
    let activity = ActivityPoller::with_system(
        Box::new(arbitration_over(volumes.clone())),
        Box::new(registry()),
    );
    let process =
        ProcessPoller::with_system(Box::new(process_source_over("1 backupd", usages.clone())));

    let mut monitor = StorageMonitor::with_pollers(
        capacity,
        activity,
        process,
        Duration::from_millis(25),
        Settings::default(),
    )
    .await
    .unwrap();

    // Capacity and process updates arrive on the device cadence; once the
    // first process poll has primed its baseline, inject some traffic and
    // wait for it to surface.
    let mut saw_capacity = false;
    let mut primed = false;
    let mut busy_process = None;
    for _ in 0..40 {
        match monitor.next_update().await.unwrap() {
            StorageUpdate::Capacity(drives) => {
                assert_eq!(drives.len(), 1);
                assert_eq!(drives[0].bsd_name, "disk1s1");
                assert_eq!(drives[0].free, 100);
                saw_capacity = true;
            },
            StorageUpdate::Processes(top) if !primed => {
                assert!(top.is_empty());
                primed = true;
                usages
                    .lock()
                    .insert(1, ProcessUsage { bytes_read: 4096, bytes_written: 0 });
            },
            StorageUpdate::Processes(top) => {
                if let Some(entry) = top.first() {
                    busy_process = Some(entry.clone());
                }
            },
            StorageUpdate::Activity(_) => {},
        }
        if saw_capacity && busy_process.is_some() {
            break;
        }
    }

    assert!(saw_capacity);
    let entry = busy_process.expect("traffic must surface in a process update");
    assert_eq!(entry.pid, 1);
    assert_eq!(entry.name, "backupd");
    assert_eq!(entry.read, 4096);

    monitor.stop().await.unwrap();
}
