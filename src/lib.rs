//! Darwin Storage - A Rust library for polling macOS storage metrics
//!
//! This crate watches the storage side of a Mac: which drives are mounted,
//! how full they are, how many bytes they move per second, and which
//! processes are responsible for the traffic. It talks directly to the
//! DiskArbitration and IOKit frameworks plus `proc_pid_rusage`, and hands
//! results to the host application through per-poll callbacks.
//!
//! # Features
//!
//! - **Capacity polling**: mounted-volume enumeration, drive resolution,
//!   free/total bytes with a two-tier query fallback
//! - **Activity polling**: per-drive read/write throughput derived from
//!   cumulative IO-registry counters
//! - **Process I/O polling**: top-N processes ranked by disk bytes moved
//!   since the previous poll
//! - **Async monitoring**: an optional tokio-driven [`monitor::StorageMonitor`]
//!   that runs all three pollers on their own cadences and yields updates
//!   as a stream
//!
//! Pollers are driven externally: the host scheduler calls `read()` with
//! the current [`Settings`] and a callback, and the poller invokes the
//! callback at most once with a snapshot of results.
//!
//! # Examples
//!
//! ```no_run
//! # #[cfg(target_os = "macos")]
//! # fn main() {
//! use darwin_storage::prelude::*;
//!
//! let mut poller = CapacityPoller::new();
//! let settings = Settings::default();
//!
//! poller.read(&settings, |drives| {
//!     for drive in drives {
//!         println!("{}: {} of {} bytes free", drive.media_name, drive.free, drive.size);
//!     }
//! });
//! # }
//! # #[cfg(not(target_os = "macos"))]
//! # fn main() {}
//! ```
//!
//! # Safety
//!
//! On macOS the crate calls into DiskArbitration, IOKit and libproc via
//! FFI. All unsafe calls live in the `system::macos` backend behind safe
//! trait facades; CoreFoundation objects are released through scope guards
//! and null/status checks precede every dereference.
//!
//! # Testing off-macOS
//!
//! Every OS facility sits behind a trait in [`system`], and mockall mocks
//! for those traits ship with the crate. The pollers themselves are
//! platform-independent, so reconciliation, delta and ranking logic can be
//! exercised on any OS by constructing pollers with mock backends.

#![doc(html_root_url = "https://docs.rs/darwin-storage/0.1.0")]

pub mod config;
pub mod disk;
pub mod error;
pub mod monitor;
pub mod process;
pub mod system;

pub use config::Settings;
pub use error::{Error, Result};

/// Re-export common types for convenience
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::disk::{ActivityPoller, CapacityPoller, Drive, DriveActivity, DriveList};
    pub use crate::error::{Error, Result};
    pub use crate::monitor::{StorageMonitor, StorageMonitoring, StorageUpdate};
    pub use crate::process::{ProcessIo, ProcessPoller};
}
