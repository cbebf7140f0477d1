//! Mock builders shared by the disk pollers' unit tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::system::{DeviceDescription, MockArbitrationSession, MockDiskArbitration};

/// One mounted volume as the arbitration mocks present it: an enumerated
/// mount path, the identifier it resolves to, and the description the
/// session hands back for it.
#[derive(Debug, Clone)]
pub(crate) struct FakeVolume {
    pub(crate) mount: &'static str,
    pub(crate) bsd_name: &'static str,
    pub(crate) description: DeviceDescription,
}

pub(crate) fn volume(
    mount: &'static str,
    bsd_name: &'static str,
    name: &'static str,
) -> FakeVolume {
    FakeVolume {
        mount,
        bsd_name,
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

pub(crate) fn removable_volume(
    mount: &'static str,
    bsd_name: &'static str,
    name: &'static str,
) -> FakeVolume {
    let mut fake = volume(mount, bsd_name, name);
    fake.description.removable = true;
    fake.description.protocol = Some("USB".to_string());
    fake
}

/// Arbitration mock over a fixed volume table.
pub(crate) fn arbitration_for(volumes: Vec<FakeVolume>) -> MockDiskArbitration {
    arbitration_sharing(Arc::new(Mutex::new(volumes)))
}

/// Arbitration mock whose volume table the test mutates between polls,
/// for mount/unmount scenarios.
pub(crate) fn arbitration_sharing(
    state: Arc<Mutex<Vec<FakeVolume>>>,
) -> MockDiskArbitration {
    let mut arbitration = MockDiskArbitration::new();

    let mounts = state.clone();
    arbitration.expect_mounted_volumes().returning(move || {
        Ok(mounts.lock().iter().map(|v| PathBuf::from(v.mount)).collect())
    });

    arbitration.expect_open_session().returning(move || {
        let mut session = MockArbitrationSession::new();

        let lookup = state.clone();
        session.expect_device_identifier().returning(move |path: &Path| {
            lookup
                .lock()
                .iter()
                .find(|v| Path::new(v.mount) == path)
                .map(|v| v.bsd_name.to_string())
        });

        let lookup = state.clone();
        session.expect_describe().returning(move |path: &Path| {
            lookup
                .lock()
                .iter()
                .find(|v| Path::new(v.mount) == path)
                .map(|v| v.description.clone())
        });

        Ok(Box::new(session))
    });

    arbitration
}
