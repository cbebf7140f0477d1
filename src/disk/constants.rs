/// Reserved name of the hidden recovery volume; never reported.
pub const RECOVERY_VOLUME: &str = "Recovery";

/// Mount directory for non-root volumes.
pub const VOLUMES_DIR: &str = "Volumes";

/// IO-registry property dictionary holding a driver's I/O counters.
pub const STATISTICS_PROPERTY: &str = "Statistics";

/// Cumulative read-byte counter inside the statistics dictionary.
pub const BYTES_READ_KEY: &str = "Bytes (Read)";

/// Cumulative write-byte counter inside the statistics dictionary.
pub const BYTES_WRITTEN_KEY: &str = "Bytes (Write)";

/// Cadence the activity poller expects: throughput deltas are only
/// meaningful at a fixed interval.
pub const ACTIVITY_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);
