//! Background monitoring over all three pollers.
//!
//! [`StorageMonitor`] owns a capacity, an activity and a process poller
//! and drives them from one background tokio task: capacity and process
//! polls run on the host-chosen interval, activity polls on the fixed
//! one-second cadence the activity poller declares. Each completed poll
//! is forwarded as a [`StorageUpdate`] through a bounded channel, and the
//! current [`Settings`] are re-read before every poll, so changes made
//! through [`StorageMonitor::set_settings`] apply from the next cycle.
//!
//! Poller FFI runs on the blocking pool; the monitor task itself only
//! schedules and forwards.
//!
//! ```no_run
//! # #[cfg(target_os = "macos")]
//! # fn main() -> darwin_storage::Result<()> {
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! use std::time::Duration;
//!
//! use darwin_storage::config::Settings;
//! use darwin_storage::monitor::{StorageMonitor, StorageUpdate};
//!
//! let mut monitor = StorageMonitor::new(Duration::from_secs(5), Settings::default()).await?;
//!
//! match monitor.next_update().await? {
//!     StorageUpdate::Capacity(drives) => println!("{} drives mounted", drives.len()),
//!     StorageUpdate::Activity(drives) => println!("{} drives active", drives.len()),
//!     StorageUpdate::Processes(top) => println!("{} busy processes", top.len()),
//! }
//!
//! monitor.stop().await?;
//! # Ok(())
//! # })
//! # }
//! # #[cfg(not(target_os = "macos"))]
//! # fn main() {}
//! ```

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::disk::{ActivityPoller, CapacityPoller, Drive};
use crate::error::{Error, Result};
use crate::process::{ProcessIo, ProcessPoller};

/// One poller's results for one completed poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageUpdate {
    /// Reconciled drive list with fresh free/total bytes.
    Capacity(Vec<Drive>),
    /// Reconciled drive list with fresh read/write rates.
    Activity(Vec<Drive>),
    /// Top disk-I/O consumers for the interval, largest first.
    Processes(Vec<ProcessIo>),
}

/// Drives the three storage pollers from a background task.
///
/// Updates are consumed with [`next_update`](Self::next_update) or by
/// treating the monitor as a [`Stream`]. Dropping the monitor aborts the
/// background task; calling [`stop`](Self::stop) shuts it down cleanly.
#[derive(Debug)]
pub struct StorageMonitor {
    poll_interval: Duration,
    settings_tx: watch::Sender<Settings>,
    stop_tx: mpsc::Sender<()>,
    monitor_task: Option<JoinHandle<()>>,
    update_rx: mpsc::Receiver<StorageUpdate>,
}

#[cfg(target_os = "macos")]
impl StorageMonitor {
    /// Monitor over the live system pollers.
    ///
    /// `poll_interval` paces capacity and process polls; activity polls
    /// run at [`ActivityPoller::interval`] regardless.
    pub async fn new(poll_interval: Duration, settings: Settings) -> Result<Self> {
        Self::with_pollers(
            CapacityPoller::new(),
            ActivityPoller::new(),
            ProcessPoller::new(),
            poll_interval,
            settings,
        )
        .await
    }
}

impl StorageMonitor {
    /// Monitor over explicitly constructed pollers; tests use this with
    /// mock-backed ones.
    pub async fn with_pollers(
        capacity: CapacityPoller,
        activity: ActivityPoller,
        process: ProcessPoller,
        poll_interval: Duration,
        settings: Settings,
    ) -> Result<Self> {
        let (update_tx, update_rx) = mpsc::channel(10);
        let (stop_tx, mut stop_rx) = mpsc::channel(1);
        let (settings_tx, settings_rx) = watch::channel(settings);

        let monitor_task = tokio::spawn(async move {
            let mut capacity = capacity;
            let mut activity = activity;
            let mut process = process;
            let mut last_device_poll = Instant::now();
            let mut last_activity_poll = Instant::now();

            loop {
                if stop_rx.try_recv().is_ok() {
                    debug!("storage monitor stopping");
                    break;
                }

                let now = Instant::now();

                if now.duration_since(last_device_poll) >= poll_interval {
                    let settings = *settings_rx.borrow();
                    let outcome = tokio::task::spawn_blocking(move || {
                        let mut batch = Vec::new();
                        capacity.read(&settings, |drives| {
                            batch.push(StorageUpdate::Capacity(drives.to_vec()));
                        });
                        process.read(&settings, |top| {
                            batch.push(StorageUpdate::Processes(top.to_vec()));
                        });
                        (capacity, process, batch)
                    })
                    .await;
                    let batch = match outcome {
                        Ok((returned_capacity, returned_process, batch)) => {
                            capacity = returned_capacity;
                            process = returned_process;
                            batch
                        },
                        Err(err) => {
                            warn!("device poll task failed: {err}");
                            break;
                        },
                    };
                    for update in batch {
                        if update_tx.send(update).await.is_err() {
                            return;
                        }
                    }
                    last_device_poll = now;
                }

                if now.duration_since(last_activity_poll) >= ActivityPoller::interval() {
                    let settings = *settings_rx.borrow();
                    let outcome = tokio::task::spawn_blocking(move || {
                        let mut update = None;
                        activity.read(&settings, |drives| {
                            update = Some(StorageUpdate::Activity(drives.to_vec()));
                        });
                        (activity, update)
                    })
                    .await;
                    let update = match outcome {
                        Ok((returned_activity, update)) => {
                            activity = returned_activity;
                            update
                        },
                        Err(err) => {
                            warn!("activity poll task failed: {err}");
                            break;
                        },
                    };
                    if let Some(update) = update {
                        if update_tx.send(update).await.is_err() {
                            return;
                        }
                    }
                    last_activity_poll = now;
                }

                time::sleep(Duration::from_millis(50)).await;
            }
        });

        Ok(Self {
            poll_interval,
            settings_tx,
            stop_tx,
            monitor_task: Some(monitor_task),
            update_rx,
        })
    }

    /// The capacity/process polling cadence this monitor was built with.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Replace the settings used by every poll from the next cycle on.
    pub fn set_settings(&self, settings: Settings) {
        self.settings_tx.send_replace(settings);
    }

    /// Wait for the next update from any poller.
    ///
    /// Errors if no update arrives within ten seconds or the monitor has
    /// stopped. Aborted poll cycles produce no update, so a monitor whose
    /// polls all fail eventually times out here.
    pub async fn next_update(&mut self) -> Result<StorageUpdate> {
        time::timeout(Duration::from_secs(10), self.update_rx.recv())
            .await
            .map_err(|_| Error::system("no storage update within timeout"))?
            .ok_or(Error::ChannelClosed)
    }

    /// Stop the background task and wait for it to finish.
    ///
    /// Dropping the monitor aborts the task instead; stopping explicitly
    /// surfaces a panic in the poll loop, if one occurred.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(handle) = self.monitor_task.take() {
            self.stop_tx
                .send(())
                .await
                .map_err(|_| Error::system("monitor already stopped"))?;

            match time::timeout(Duration::from_secs(5), handle).await {
                Ok(result) => {
                    result.map_err(|e| Error::system(format!("monitor task panicked: {e}")))?;
                },
                Err(_) => {
                    return Err(Error::system("timed out waiting for monitor to stop"));
                },
            }
        }

        Ok(())
    }
}

impl Drop for StorageMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.monitor_task.take() {
            let _ = self.stop_tx.try_send(());
            handle.abort();
        }
    }
}

impl Stream for StorageMonitor {
    type Item = StorageUpdate;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().update_rx.poll_recv(cx)
    }
}

/// Async monitoring surface, for hosts that want to own the monitor
/// behind a trait object.
#[async_trait]
pub trait StorageMonitoring: Send + Sync {
    /// Wait for the next update from any poller.
    async fn next_update(&mut self) -> Result<StorageUpdate>;

    /// Stop the background task.
    async fn stop(&mut self) -> Result<()>;
}

#[async_trait]
impl StorageMonitoring for StorageMonitor {
    async fn next_update(&mut self) -> Result<StorageUpdate> {
        self.next_update().await
    }

    async fn stop(&mut self) -> Result<()> {
        self.stop().await
    }
}
