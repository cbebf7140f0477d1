//! Top-N processes by disk I/O since the previous poll.
//!
//! Each poll lists the caller's processes, reads cumulative disk counters
//! for every listed pid, and diffs them against the counters stored on
//! the previous poll. Only processes that moved bytes in the interval are
//! reported, ranked by their larger direction of traffic.
//!
//! ```no_run
//! # #[cfg(target_os = "macos")]
//! # fn main() {
//! use darwin_storage::process::ProcessPoller;
//! use darwin_storage::config::Settings;
//!
//! let poller = ProcessPoller::new();
//! // First poll primes the counter baselines and reports nothing.
//! poller.read(&Settings::default(), |_| {});
//! poller.read(&Settings::default(), |top| {
//!     for entry in top {
//!         println!("{} ({}) +{}B read +{}B written", entry.name, entry.pid, entry.read, entry.write);
//!     }
//! });
//! # }
//! # #[cfg(not(target_os = "macos"))]
//! # fn main() {}
//! ```

mod counters;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Settings;
use crate::system::ProcessSource;

use counters::CounterTable;

/// One process's disk traffic over the last poll interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessIo {
    pub pid: i32,
    /// First token of the command name, as the listing tool reports it.
    pub name: String,
    /// Bytes read since the previous poll.
    pub read: i64,
    /// Bytes written since the previous poll.
    pub write: i64,
}

/// Polls per-process cumulative disk counters and reports the top
/// consumers for the interval.
///
/// The callback receives at most [`Settings::top_processes`] entries,
/// largest first. The poller keeps per-pid state across polls; dropping
/// it forgets every baseline.
#[derive(Debug)]
pub struct ProcessPoller {
    source: Box<dyn ProcessSource>,
    counters: CounterTable,
}

#[cfg(target_os = "macos")]
impl ProcessPoller {
    /// Poller backed by `/bin/ps` and `proc_pid_rusage`.
    pub fn new() -> Self {
        Self::with_system(Box::new(crate::system::ProcessSourceImpl))
    }
}

#[cfg(target_os = "macos")]
impl Default for ProcessPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessPoller {
    /// Poller with an explicit backend; tests pass mocks here.
    pub fn with_system(source: Box<dyn ProcessSource>) -> Self {
        Self { source, counters: CounterTable::default() }
    }

    /// One poll cycle.
    ///
    /// Skipped entirely when `top_processes` is zero. A listing failure
    /// aborts the cycle without invoking the callback; a process that
    /// exits between listing and the usage query is skipped on its own.
    pub fn read(&self, settings: &Settings, mut callback: impl FnMut(&[ProcessIo])) {
        let top = settings.top_processes;
        if top == 0 {
            return;
        }

        let output = match self.source.list_output() {
            Ok(output) => output,
            Err(err) => {
                warn!("process poll aborted, listing failed: {err}");
                return;
            }
        };

        let mut processes: Vec<ProcessIo> = Vec::new();
        for line in output.lines() {
            let Some((pid, name)) = parse_line(line) else {
                continue;
            };
            let Some(usage) = self.source.disk_usage(pid) else {
                continue;
            };
            let (read, write) = self.counters.update(pid, usage);
            if read != 0 || write != 0 {
                processes.push(ProcessIo { pid, name: name.to_string(), read, write });
            }
        }

        processes.sort_by(io_ordering);
        if processes.len() > top {
            processes = processes.split_off(processes.len() - top);
        }
        processes.reverse();

        callback(&processes);
    }
}

/// Parse one listing line into pid and name.
///
/// The pid must be a bare run of digits; the header line and anything
/// else non-conforming is rejected. The name is the following token, so a
/// command name containing spaces is cut at the first one.
fn parse_line(line: &str) -> Option<(i32, &str)> {
    let mut tokens = line.split_whitespace();
    let token = tokens.next()?;
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let pid = token.parse().ok()?;
    Some((pid, tokens.next().unwrap_or("")))
}

/// Ascending order by the larger of the two directions, ties broken by
/// the smaller one.
fn io_ordering(a: &ProcessIo, b: &ProcessIo) -> Ordering {
    let a_max = a.read.max(a.write);
    let b_max = b.read.max(b.write);
    if a_max == b_max {
        let a_min = a.read.min(a.write);
        let b_min = b.read.min(b.write);
        if a_min != b_min {
            return a_min.cmp(&b_min);
        }
    }
    a_max.cmp(&b_max)
}
