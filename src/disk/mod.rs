//! Drive tracking: capacity and activity polling over shared resolution.
//!
//! Both pollers walk the mounted volumes, resolve each eligible mount to
//! its BSD device through a disk-arbitration session, and reconcile a
//! per-poller [`DriveList`] against what is currently mounted. They differ
//! in what they do per drive: [`CapacityPoller`] refreshes free/total
//! bytes, [`ActivityPoller`] turns the driver's cumulative byte counters
//! into per-interval read/write rates.
//!
//! A volume is considered only when it is the root filesystem or lives
//! directly under `/Volumes`; anything resolving to a recovery volume is
//! skipped, and removable drives are tracked only while
//! [`Settings::include_removable`](crate::config::Settings) is set.
//!
//! ```no_run
//! # #[cfg(target_os = "macos")]
//! # fn main() {
//! use darwin_storage::disk::ActivityPoller;
//! use darwin_storage::config::Settings;
//!
//! let mut poller = ActivityPoller::new();
//! poller.read(&Settings::default(), |drives| {
//!     for drive in drives {
//!         println!("{} read {} B/s", drive.bsd_name, drive.activity.read);
//!     }
//! });
//! # }
//! # #[cfg(not(target_os = "macos"))]
//! # fn main() {}
//! ```

mod activity;
mod capacity;
pub(crate) mod constants;
mod resolver;
#[cfg(test)]
pub(crate) mod test_support;
mod types;

pub use activity::ActivityPoller;
pub use capacity::CapacityPoller;
pub use types::{Drive, DriveActivity, DriveList};
