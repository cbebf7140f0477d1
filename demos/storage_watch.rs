//! Watches drive capacity, activity and process I/O through the
//! background monitor.
//!
//! Run with `cargo run --example storage_watch`.

#[cfg(target_os = "macos")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::time::Duration;

    use darwin_storage::config::Settings;
    use darwin_storage::monitor::{StorageMonitor, StorageUpdate};

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Darwin Storage - Storage Watch Example");
    println!("Press Ctrl+C to exit\n");

    let settings = Settings { include_removable: true, ..Settings::default() };
    let mut monitor = StorageMonitor::new(Duration::from_secs(5), settings).await?;

    loop {
        match monitor.next_update().await? {
            StorageUpdate::Capacity(drives) => {
                println!("-- capacity --");
                for drive in &drives {
                    println!(
                        "{:<10} {:<24} {} free of {}",
                        drive.bsd_name,
                        drive.media_name,
                        format_bytes(drive.free),
                        format_bytes(drive.size),
                    );
                }
            },
            StorageUpdate::Activity(drives) => {
                for drive in &drives {
                    if drive.activity.read != 0 || drive.activity.write != 0 {
                        println!(
                            "{:<10} read {}/s, write {}/s",
                            drive.bsd_name,
                            format_rate(drive.activity.read),
                            format_rate(drive.activity.write),
                        );
                    }
                }
            },
            StorageUpdate::Processes(top) => {
                for entry in &top {
                    println!(
                        "{:>7} {:<20} read {}, write {}",
                        entry.pid,
                        entry.name,
                        format_rate(entry.read),
                        format_rate(entry.write),
                    );
                }
            },
        }
    }
}

#[cfg(target_os = "macos")]
fn format_rate(bytes: i64) -> String {
    if bytes < 0 {
        format!("-{}", format_bytes(bytes.unsigned_abs()))
    } else {
        format_bytes(bytes as u64)
    }
}

// Helper function to convert bytes to human-readable format
#[cfg(target_os = "macos")]
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(not(target_os = "macos"))]
fn main() {
    eprintln!("storage_watch only runs on macOS");
}
