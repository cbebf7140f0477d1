//! macOS backends for the system traits.
//!
//! `DiskArbitrationImpl` resolves volumes through a real `DASession`,
//! `IoRegistryImpl` walks the IOService plane, `VolumeStatsImpl` reads
//! `statfs`/`statvfs`, and `ProcessSourceImpl` shells out to `/bin/ps`
//! and queries `proc_pid_rusage` through libproc.

mod bindings;

use std::ffi::{CStr, CString};
use std::io;
use std::mem::MaybeUninit;
use std::os::raw::{c_char, c_int};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::ptr;

use libproc::libproc::pid_rusage::{pidrusage, RUsageInfoV2};
use scopeguard::guard;

use crate::disk::constants::{BYTES_READ_KEY, BYTES_WRITTEN_KEY, STATISTICS_PROPERTY};
use crate::error::{Error, Result};

use super::{
    ArbitrationSession, DeviceDescription, DiskArbitration, DriveStatistics, IoRegistry,
    ProcessSource, ProcessUsage, RegistryEntry, VolumeSpace, VolumeStats,
};

use bindings::*;

/// Prefix of device nodes in mount-table "from" names.
const DEV_PREFIX: &str = "/dev/";

/// Buffer size for CFString extraction; volume names and model strings
/// are far below this.
const STRING_BUF_LEN: usize = 512;

/// Arguments for the process listing: caller-owned processes, executable
/// name only, pid+command columns, sorted by current CPU.
const PS_ARGS: [&str; 3] = ["-xco", "pid,command", "-r"];

fn cstr_to_string(chars: &[c_char]) -> String {
    // Mount-table strings are NUL-terminated by the kernel.
    unsafe { CStr::from_ptr(chars.as_ptr()) }.to_string_lossy().into_owned()
}

fn path_to_cstring(path: &Path) -> Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| Error::invalid_data(format!("path contains NUL: {}", path.display())))
}

/// Volume enumeration via `getfsstat` and session creation via
/// `DASessionCreate`.
#[derive(Debug, Default)]
pub struct DiskArbitrationImpl;

impl DiskArbitration for DiskArbitrationImpl {
    fn mounted_volumes(&self) -> Result<Vec<PathBuf>> {
        unsafe {
            let count = libc::getfsstat(ptr::null_mut(), 0, libc::MNT_NOWAIT);
            if count < 0 {
                return Err(Error::system(format!(
                    "getfsstat size query failed: {}",
                    io::Error::last_os_error()
                )));
            }

            let mut mounts: Vec<libc::statfs> = Vec::with_capacity(count as usize);
            let bufsize = (count as usize * std::mem::size_of::<libc::statfs>()) as c_int;
            let written = libc::getfsstat(mounts.as_mut_ptr(), bufsize, libc::MNT_NOWAIT);
            if written < 0 {
                return Err(Error::system(format!(
                    "getfsstat failed: {}",
                    io::Error::last_os_error()
                )));
            }
            mounts.set_len(written as usize);

            Ok(mounts
                .iter()
                .map(|fs| PathBuf::from(cstr_to_string(&fs.f_mntonname)))
                .collect())
        }
    }

    fn open_session(&self) -> Result<Box<dyn ArbitrationSession>> {
        let session = unsafe { DASessionCreate(ptr::null()) };
        if session.is_null() {
            return Err(Error::arbitration("DASessionCreate returned null"));
        }
        Ok(Box::new(ArbitrationSessionImpl { session }))
    }
}

/// One live `DASession`. Not `Send`: sessions stay on the thread that
/// polls with them and are dropped before `read()` returns.
#[derive(Debug)]
struct ArbitrationSessionImpl {
    session: DASessionRef,
}

impl Drop for ArbitrationSessionImpl {
    fn drop(&mut self) {
        unsafe { CFRelease(self.session) };
    }
}

impl ArbitrationSessionImpl {
    /// Resolve a mount path to a `DADisk` via the mount table's device
    /// node. Non-device mounts (autofs maps, network shares) have no
    /// `/dev/` node and resolve to `None`.
    fn disk_for(&self, volume: &Path) -> Option<impl std::ops::Deref<Target = DADiskRef> + '_> {
        let c_path = path_to_cstring(volume).ok()?;
        let mut fs = MaybeUninit::<libc::statfs>::uninit();
        if unsafe { libc::statfs(c_path.as_ptr(), fs.as_mut_ptr()) } != 0 {
            return None;
        }
        let fs = unsafe { fs.assume_init() };

        let device = cstr_to_string(&fs.f_mntfromname);
        let bsd_name = device.strip_prefix(DEV_PREFIX)?;
        let c_name = CString::new(bsd_name).ok()?;

        let disk = unsafe { DADiskCreateFromBSDName(ptr::null(), self.session, c_name.as_ptr()) };
        if disk.is_null() {
            return None;
        }
        Some(guard(disk, |disk| unsafe { CFRelease(disk) }))
    }
}

impl ArbitrationSession for ArbitrationSessionImpl {
    fn device_identifier(&self, volume: &Path) -> Option<String> {
        let disk = self.disk_for(volume)?;
        // Get rule: the name is owned by the disk object, no release.
        let name = unsafe { DADiskGetBSDName(*disk) };
        if name.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned())
    }

    fn describe(&self, volume: &Path) -> Option<DeviceDescription> {
        let disk = self.disk_for(volume)?;
        let description = unsafe { DADiskCopyDescription(*disk) };
        if description.is_null() {
            return None;
        }
        let description = guard(description, |description| unsafe { CFRelease(description) });

        let mut desc = DeviceDescription::default();
        unsafe {
            desc.removable =
                dict_boolean(*description, kDADiskDescriptionMediaRemovableKey).unwrap_or(false);
            desc.volume_name = dict_string(*description, kDADiskDescriptionVolumeNameKey);
            desc.media_name = dict_string(*description, kDADiskDescriptionMediaNameKey);
            desc.model = dict_string(*description, kDADiskDescriptionDeviceModelKey);
            desc.protocol = dict_string(*description, kDADiskDescriptionDeviceProtocolKey);
            desc.volume_kind = dict_string(*description, kDADiskDescriptionVolumeKindKey);
            desc.volume_path = dict_url_path(*description, kDADiskDescriptionVolumePathKey);

            let media = DADiskCopyIOMedia(*disk);
            if media != 0 {
                desc.media_entry = Some(RegistryEntry::from_raw(u64::from(media)));
            }
        }
        Some(desc)
    }
}

/// Registry traversal in the IOService plane.
#[derive(Debug, Default)]
pub struct IoRegistryImpl;

impl IoRegistry for IoRegistryImpl {
    fn parent(&self, entry: RegistryEntry) -> Option<RegistryEntry> {
        let mut parent: io_registry_entry_t = 0;
        let status = unsafe {
            IORegistryEntryGetParentEntry(
                entry.raw() as io_registry_entry_t,
                c"IOService".as_ptr(),
                &mut parent,
            )
        };
        (status == KERN_SUCCESS && parent != 0).then(|| RegistryEntry::from_raw(u64::from(parent)))
    }

    fn statistics(&self, entry: RegistryEntry) -> Option<DriveStatistics> {
        unsafe {
            let mut props: CFMutableDictionaryRef = ptr::null_mut();
            let status = IORegistryEntryCreateCFProperties(
                entry.raw() as io_registry_entry_t,
                &mut props,
                ptr::null(),
                0,
            );
            if status != KERN_SUCCESS || props.is_null() {
                return None;
            }
            let props = guard(props, |props| CFRelease(props as CFTypeRef));

            let stats_key = cf_string(STATISTICS_PROPERTY)?;
            let stats = dict_value(*props as CFDictionaryRef, *stats_key)?;
            if CFGetTypeID(stats) != CFDictionaryGetTypeID() {
                return None;
            }

            let read_key = cf_string(BYTES_READ_KEY)?;
            let write_key = cf_string(BYTES_WRITTEN_KEY)?;
            Some(DriveStatistics {
                bytes_read: dict_i64(stats, *read_key).unwrap_or(0),
                bytes_written: dict_i64(stats, *write_key).unwrap_or(0),
            })
        }
    }
}

/// Free/total byte queries: `statfs` primary, `statvfs` fallback.
#[derive(Debug, Default)]
pub struct VolumeStatsImpl;

impl VolumeStats for VolumeStatsImpl {
    fn filesystem_attributes(&self, mount: &Path) -> Result<VolumeSpace> {
        let c_path = path_to_cstring(mount)?;
        let mut fs = MaybeUninit::<libc::statfs>::uninit();
        if unsafe { libc::statfs(c_path.as_ptr(), fs.as_mut_ptr()) } != 0 {
            return Err(Error::system(format!(
                "statfs({}) failed: {}",
                mount.display(),
                io::Error::last_os_error()
            )));
        }
        let fs = unsafe { fs.assume_init() };

        let block = u64::from(fs.f_bsize);
        Ok(VolumeSpace {
            free: fs.f_bavail.saturating_mul(block),
            total: fs.f_blocks.saturating_mul(block),
        })
    }

    fn resource_values(&self, mount: &Path) -> Result<VolumeSpace> {
        let c_path = path_to_cstring(mount)?;
        let mut fs = MaybeUninit::<libc::statvfs>::uninit();
        if unsafe { libc::statvfs(c_path.as_ptr(), fs.as_mut_ptr()) } != 0 {
            return Err(Error::system(format!(
                "statvfs({}) failed: {}",
                mount.display(),
                io::Error::last_os_error()
            )));
        }
        let fs = unsafe { fs.assume_init() };

        let frag = fs.f_frsize as u64;
        let space = VolumeSpace {
            free: u64::from(fs.f_bavail).saturating_mul(frag),
            total: u64::from(fs.f_blocks).saturating_mul(frag),
        };
        if space.total == 0 {
            return Err(Error::system(format!(
                "statvfs({}) reported zero capacity",
                mount.display()
            )));
        }
        Ok(space)
    }
}

/// Process listing via `/bin/ps`, usage via `proc_pid_rusage`.
#[derive(Debug, Default)]
pub struct ProcessSourceImpl;

impl ProcessSource for ProcessSourceImpl {
    fn list_output(&self) -> Result<String> {
        let output = Command::new("/bin/ps").args(PS_ARGS).output()?;
        if !output.status.success() {
            return Err(Error::system(format!("ps exited with {}", output.status)));
        }
        String::from_utf8(output.stdout)
            .map_err(|_| Error::invalid_data("ps produced non-UTF-8 output"))
    }

    fn disk_usage(&self, pid: i32) -> Option<ProcessUsage> {
        let usage = pidrusage::<RUsageInfoV2>(pid).ok()?;
        Some(ProcessUsage {
            bytes_read: usage.ri_diskio_bytesread as i64,
            bytes_written: usage.ri_diskio_byteswritten as i64,
        })
    }
}

//------------------------------------------------------------------------------
// CF value helpers
//------------------------------------------------------------------------------

unsafe fn dict_value(dict: CFDictionaryRef, key: CFStringRef) -> Option<CFTypeRef> {
    let value = CFDictionaryGetValue(dict, key);
    (!value.is_null()).then_some(value)
}

unsafe fn dict_boolean(dict: CFDictionaryRef, key: CFStringRef) -> Option<bool> {
    let value = dict_value(dict, key)?;
    (CFGetTypeID(value) == CFBooleanGetTypeID()).then(|| CFBooleanGetValue(value) != 0)
}

unsafe fn dict_string(dict: CFDictionaryRef, key: CFStringRef) -> Option<String> {
    let value = dict_value(dict, key)?;
    if CFGetTypeID(value) != CFStringGetTypeID() {
        return None;
    }
    let mut buf = [0 as c_char; STRING_BUF_LEN];
    let ok = CFStringGetCString(
        value,
        buf.as_mut_ptr(),
        buf.len() as CFIndex,
        CF_STRING_ENCODING_UTF8,
    );
    if ok == 0 {
        return None;
    }
    Some(CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned())
}

unsafe fn dict_i64(dict: CFDictionaryRef, key: CFStringRef) -> Option<i64> {
    let value = dict_value(dict, key)?;
    if CFGetTypeID(value) != CFNumberGetTypeID() {
        return None;
    }
    let mut out: i64 = 0;
    let ok = CFNumberGetValue(value, CF_NUMBER_SINT64_TYPE, (&mut out as *mut i64).cast());
    (ok != 0).then_some(out)
}

unsafe fn dict_url_path(dict: CFDictionaryRef, key: CFStringRef) -> Option<PathBuf> {
    let value = dict_value(dict, key)?;
    if CFGetTypeID(value) != CFURLGetTypeID() {
        return None;
    }
    let mut buf = [0u8; libc::PATH_MAX as usize];
    let ok = CFURLGetFileSystemRepresentation(value, 1, buf.as_mut_ptr(), buf.len() as CFIndex);
    if ok == 0 {
        return None;
    }
    let len = buf.iter().position(|&b| b == 0)?;
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(&buf[..len])))
}

/// Owned CFString for dictionary lookups, released on scope exit.
unsafe fn cf_string(s: &str) -> Option<impl std::ops::Deref<Target = CFStringRef>> {
    let c = CString::new(s).ok()?;
    let string = CFStringCreateWithCString(ptr::null(), c.as_ptr(), CF_STRING_ENCODING_UTF8);
    if string.is_null() {
        return None;
    }
    Some(guard(string, |string| CFRelease(string)))
}
