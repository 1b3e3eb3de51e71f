//! Worker utilization example
//!
//! Runs a mixed load of sleeping and CPU-burning jobs, then prints each
//! worker's accumulated loop, execution, and managing times broken into
//! wall/user/system components.
//!
//! Run with: cargo run --example worker_utilization

use std::thread;
use std::time::Duration;
use workpool::prelude::*;

fn print_times(label: &str, times: &CpuTimes) {
    println!(
        "  {:<10} wall {:>10.2?}  user {:>10.2?}  system {:>10.2?}",
        label, times.wall, times.user, times.system
    );
}

fn main() -> Result<()> {
    let pool = WorkerPool::with_workers(2)?;

    // Even jobs sleep (wall time, no CPU), odd jobs burn CPU.
    let handles: Vec<_> = (0u64..8)
        .map(|i| {
            pool.submit(move || {
                if i % 2 == 0 {
                    thread::sleep(Duration::from_millis(25));
                    0u64
                } else {
                    (0..2_000_000u64).fold(0u64, |acc, x| acc.wrapping_add(x * x))
                }
            })
        })
        .collect::<Result<_>>()?;
    for handle in handles {
        handle.wait()?;
    }

    // Handles are fulfilled from inside the jobs; give the workers a beat to
    // book their final iterations before snapshotting.
    thread::sleep(Duration::from_millis(20));

    for (id, usage) in pool.worker_stats().iter().enumerate() {
        println!(
            "worker {} ({} processed, {} failed):",
            id, usage.jobs_processed, usage.jobs_failed
        );
        print_times("total", &usage.total);
        print_times("executing", &usage.executing);
        print_times("managing", &usage.managing());
    }

    Ok(())
}
