//! Per-pid cumulative counter state.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::system::ProcessUsage;

/// Previous cumulative disk counters per pid.
///
/// Mutex-guarded so the owning poller can be driven from a blocking pool
/// while the host inspects results elsewhere. Entries are never evicted:
/// the OS recycles pids, so a long-lived table can attribute one bogus
/// delta to a reused pid whose predecessor had lower counters. A correct
/// eviction scheme would need process start times to tell reuse apart
/// from a counter regression.
#[derive(Debug, Default)]
pub(crate) struct CounterTable {
    entries: Mutex<HashMap<i32, ProcessUsage>>,
}

impl CounterTable {
    /// Record the latest cumulative counters for `pid` and return the
    /// delta against the previous observation. The first observation of a
    /// pid yields `(0, 0)`.
    pub(crate) fn update(&self, pid: i32, usage: ProcessUsage) -> (i64, i64) {
        let mut entries = self.entries.lock();
        let previous = *entries.entry(pid).or_insert(usage);
        entries.insert(pid, usage);
        (
            usage.bytes_read - previous.bytes_read,
            usage.bytes_written - previous.bytes_written,
        )
    }
}
