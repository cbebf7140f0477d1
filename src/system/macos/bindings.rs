//! FFI bindings to the macOS storage frameworks.
//!
//! Centralized declarations for the C APIs the `macos` backend calls:
//!
//! - `DiskArbitration` for resolving volumes to devices and reading
//!   device description dictionaries
//! - `IOKit` for registry parent traversal and statistics properties
//! - `CoreFoundation` value accessors for the dictionary contents
//!
//! Filesystem queries (`statfs`, `statvfs`, `getfsstat`) come from the
//! `libc` crate and per-pid usage from `libproc`; neither needs
//! declarations here.

#![allow(non_upper_case_globals)]

use std::os::raw::{c_char, c_int, c_uint, c_void};

//------------------------------------------------------------------------------
// CoreFoundation base types
//------------------------------------------------------------------------------

pub type CFTypeRef = *const c_void;
pub type CFAllocatorRef = *const c_void;
pub type CFStringRef = *const c_void;
pub type CFDictionaryRef = *const c_void;
pub type CFMutableDictionaryRef = *mut c_void;
pub type CFURLRef = *const c_void;
pub type CFBooleanRef = *const c_void;
pub type CFNumberRef = *const c_void;
pub type CFIndex = isize;
pub type CFTypeID = usize;
pub type CFNumberType = CFIndex;
pub type Boolean = u8;

/// `kCFStringEncodingUTF8`
pub const CF_STRING_ENCODING_UTF8: u32 = 0x0800_0100;
/// `kCFNumberSInt64Type`
pub const CF_NUMBER_SINT64_TYPE: CFNumberType = 4;

//------------------------------------------------------------------------------
// IOKit / Mach types
//------------------------------------------------------------------------------

#[allow(non_camel_case_types)]
pub type kern_return_t = c_int;
#[allow(non_camel_case_types)]
pub type io_object_t = c_uint;
#[allow(non_camel_case_types)]
pub type io_registry_entry_t = io_object_t;

pub const KERN_SUCCESS: kern_return_t = 0;

//------------------------------------------------------------------------------
// DiskArbitration types
//------------------------------------------------------------------------------

pub type DASessionRef = *const c_void;
pub type DADiskRef = *const c_void;

//------------------------------------------------------------------------------
// External C functions and description keys
//------------------------------------------------------------------------------

#[link(name = "DiskArbitration", kind = "framework")]
extern "C" {
    pub fn DASessionCreate(allocator: CFAllocatorRef) -> DASessionRef;
    pub fn DADiskCreateFromBSDName(
        allocator: CFAllocatorRef,
        session: DASessionRef,
        name: *const c_char,
    ) -> DADiskRef;
    pub fn DADiskGetBSDName(disk: DADiskRef) -> *const c_char;
    pub fn DADiskCopyDescription(disk: DADiskRef) -> CFDictionaryRef;
    pub fn DADiskCopyIOMedia(disk: DADiskRef) -> io_registry_entry_t;

    pub static kDADiskDescriptionMediaRemovableKey: CFStringRef;
    pub static kDADiskDescriptionVolumeNameKey: CFStringRef;
    pub static kDADiskDescriptionMediaNameKey: CFStringRef;
    pub static kDADiskDescriptionDeviceModelKey: CFStringRef;
    pub static kDADiskDescriptionDeviceProtocolKey: CFStringRef;
    pub static kDADiskDescriptionVolumePathKey: CFStringRef;
    pub static kDADiskDescriptionVolumeKindKey: CFStringRef;
}

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    pub fn IORegistryEntryGetParentEntry(
        entry: io_registry_entry_t,
        plane: *const c_char,
        parent: *mut io_registry_entry_t,
    ) -> kern_return_t;
    pub fn IORegistryEntryCreateCFProperties(
        entry: io_registry_entry_t,
        properties: *mut CFMutableDictionaryRef,
        allocator: CFAllocatorRef,
        options: u32,
    ) -> kern_return_t;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    pub fn CFRelease(cf: CFTypeRef);
    pub fn CFGetTypeID(cf: CFTypeRef) -> CFTypeID;
    pub fn CFStringGetTypeID() -> CFTypeID;
    pub fn CFBooleanGetTypeID() -> CFTypeID;
    pub fn CFNumberGetTypeID() -> CFTypeID;
    pub fn CFURLGetTypeID() -> CFTypeID;
    pub fn CFDictionaryGetTypeID() -> CFTypeID;
    pub fn CFStringCreateWithCString(
        alloc: CFAllocatorRef,
        c_str: *const c_char,
        encoding: u32,
    ) -> CFStringRef;
    pub fn CFStringGetCString(
        the_string: CFStringRef,
        buffer: *mut c_char,
        buffer_size: CFIndex,
        encoding: u32,
    ) -> Boolean;
    pub fn CFBooleanGetValue(boolean: CFBooleanRef) -> Boolean;
    pub fn CFNumberGetValue(
        number: CFNumberRef,
        the_type: CFNumberType,
        value_ptr: *mut c_void,
    ) -> Boolean;
    pub fn CFDictionaryGetValue(the_dict: CFDictionaryRef, key: *const c_void) -> *const c_void;
    pub fn CFURLGetFileSystemRepresentation(
        url: CFURLRef,
        resolve_against_base: Boolean,
        buffer: *mut u8,
        max_buf_len: CFIndex,
    ) -> Boolean;
}
