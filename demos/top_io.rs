//! Prints the busiest processes by disk I/O once per second.
//!
//! Run with `cargo run --example top_io`.

#[cfg(target_os = "macos")]
fn main() {
    use std::thread::sleep;
    use std::time::Duration;

    use darwin_storage::config::Settings;
    use darwin_storage::process::ProcessPoller;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Darwin Storage - Top I/O Example");
    println!("Press Ctrl+C to exit\n");

    let settings = Settings { top_processes: 10, ..Settings::default() };
    let poller = ProcessPoller::new();

    // First poll primes the per-pid baselines and reports nothing.
    poller.read(&settings, |_| {});

    loop {
        sleep(Duration::from_secs(1));
        poller.read(&settings, |top| {
            print!("\x1B[2J\x1B[1;1H");
            println!("{:>7} {:<24} {:>14} {:>14}", "PID", "COMMAND", "READ/s", "WRITE/s");
            for entry in top {
                println!(
                    "{:>7} {:<24} {:>14} {:>14}",
                    entry.pid, entry.name, entry.read, entry.write
                );
            }
        });
    }
}

#[cfg(not(target_os = "macos"))]
fn main() {
    eprintln!("top_io only runs on macOS");
}
