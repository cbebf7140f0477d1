//! Device resolution: mounted-volume path to [`Drive`] record.
//!
//! The shared leaf routine of both device pollers. Resolution reads the
//! device description from an open arbitration session, applies the
//! naming and eligibility rules, and walks the IO-registry parent chain
//! to the ancestor that carries the statistics dictionary.

use std::path::{Component, Path};

use crate::system::{ArbitrationSession, DeviceDescription, IoRegistry, RegistryEntry};

use super::constants::{RECOVERY_VOLUME, VOLUMES_DIR};
use super::types::{Drive, DriveActivity};

/// A volume is considered when it is the filesystem root or mounted under
/// the standard volumes directory.
pub(crate) fn eligible_volume(path: &Path) -> bool {
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::RootDir), None) => true,
        (Some(Component::RootDir), Some(Component::Normal(dir))) => {
            dir.to_str() == Some(VOLUMES_DIR)
        }
        _ => false,
    }
}

/// Number of parent steps implied by the identifier: BSD names encode
/// partition nesting in their digits (`disk1s4` walks two steps). The
/// digit count is the exact step count; unusual names are out of contract.
pub(crate) fn partition_depth(bsd_name: &str) -> usize {
    bsd_name.chars().filter(char::is_ascii_digit).count()
}

/// Display name for a volume mounted under `/Volumes`: the mount folder
/// name, when non-empty.
fn volumes_mount_name(path: &Path) -> Option<String> {
    let mut components = path.components();
    if components.next() != Some(Component::RootDir) {
        return None;
    }
    match components.next() {
        Some(Component::Normal(dir)) if dir.to_str() == Some(VOLUMES_DIR) => {}
        _ => return None,
    }
    let name = path.file_name()?.to_str()?;
    (!name.is_empty()).then(|| name.to_string())
}

/// Display-name fallback chain: volume name, then media name. `None`
/// means the name matched the reserved recovery volume and the device
/// must be rejected; an empty name is acceptable.
fn display_name(description: &DeviceDescription) -> Option<String> {
    let mut name = String::new();
    if let Some(volume_name) = &description.volume_name {
        if volume_name == RECOVERY_VOLUME {
            return None;
        }
        name = volume_name.clone();
    }
    if name.is_empty() {
        if let Some(media_name) = &description.media_name {
            if media_name == RECOVERY_VOLUME {
                return None;
            }
            name = media_name.clone();
        }
    }
    Some(name)
}

fn parent_entry(
    registry: &dyn IoRegistry,
    media: RegistryEntry,
    depth: usize,
) -> Option<RegistryEntry> {
    let mut entry = media;
    for _ in 0..depth {
        entry = registry.parent(entry)?;
    }
    Some(entry)
}

/// Resolve one eligible volume to a drive record.
///
/// `None` when the device has no description, is removable while
/// removable inclusion is off, carries the reserved recovery name, or has
/// no mount path. A failed parent walk leaves `parent` unresolved but
/// does not reject the drive.
pub(crate) fn resolve_drive(
    session: &dyn ArbitrationSession,
    registry: &dyn IoRegistry,
    bsd_name: &str,
    volume: &Path,
    include_removable: bool,
) -> Option<Drive> {
    let description = session.describe(volume)?;

    if description.removable && !include_removable {
        return None;
    }

    let mut media_name = display_name(&description)?;
    let path = description.volume_path.clone()?;
    let root = path.components().count() == 1;

    if let Some(name) = volumes_mount_name(&path) {
        media_name = name;
    }

    let parent = description
        .media_entry
        .and_then(|media| parent_entry(registry, media, partition_depth(bsd_name)));

    Some(Drive {
        bsd_name: bsd_name.to_string(),
        media_name,
        model: description.model.as_deref().map(str::trim).unwrap_or_default().to_string(),
        connection: description.protocol.clone().unwrap_or_default(),
        file_system: description.volume_kind.clone().unwrap_or_default(),
        path: Some(path),
        root,
        removable: description.removable,
        parent,
        free: 0,
        size: 0,
        activity: DriveActivity::default(),
    })
}
