//! Basic worker pool usage example
//!
//! Demonstrates pool creation, job submission, and waiting on completion
//! handles.
//!
//! Run with: cargo run --example basic_usage

use std::thread;
use std::time::Duration;
use workpool::prelude::*;

fn main() -> Result<()> {
    println!("=== workpool - Basic Usage Example ===\n");

    // Create a pool with 4 worker threads
    let pool = WorkerPool::with_workers(4)?;
    println!("1. Started pool with {} workers", pool.num_workers());

    println!("\n2. Submitting squaring jobs:");
    let handles: Vec<_> = (0..10)
        .map(|i| {
            pool.submit(move || {
                thread::sleep(Duration::from_millis(10));
                i * i
            })
        })
        .collect::<Result<_>>()?;

    for (i, handle) in handles.into_iter().enumerate() {
        println!("   {}^2 = {}", i, handle.wait()?);
    }

    println!("\n3. Polling a handle instead of blocking:");
    let handle = pool.submit(|| {
        thread::sleep(Duration::from_millis(50));
        "slow job finished"
    })?;
    while !handle.is_ready() {
        println!("   not ready yet, doing something else...");
        thread::sleep(Duration::from_millis(20));
    }
    println!("   {}", handle.wait()?);

    println!("\n4. A panicking job is reported, not fatal:");
    let failing = pool.submit(|| -> u32 { panic!("exemplary failure") })?;
    match failing.wait() {
        Err(PoolError::JobPanicked { message }) => {
            println!("   job panicked as expected: {}", message);
        }
        other => println!("   unexpected outcome: {:?}", other.map(|_| ())),
    }

    println!("\n5. Shutting down...");
    pool.shutdown();

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
