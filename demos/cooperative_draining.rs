//! Cooperative draining example
//!
//! A job that waits on its own sub-jobs can exhaust the pool: once every
//! worker is blocked on a handle, nothing is left to run the sub-jobs.
//! Helping drain the queue while waiting keeps the recursion moving on a
//! pool of any size.
//!
//! Run with: cargo run --example cooperative_draining

use std::sync::Arc;
use std::thread;
use workpool::prelude::*;

/// Sums a range by splitting it in half and submitting one half as a
/// sub-job, draining the queue while the sub-job is pending.
fn sum_range(pool: &Arc<WorkerPool>, lo: u64, hi: u64) -> u64 {
    if hi - lo <= 1_000 {
        return (lo..hi).sum();
    }

    let mid = lo + (hi - lo) / 2;
    let sub = {
        let pool_for_job = Arc::clone(pool);
        pool.submit(move || sum_range(&pool_for_job, mid, hi))
            .unwrap()
    };
    let left = sum_range(pool, lo, mid);

    // Work the queue instead of just occupying a worker slot.
    while !sub.is_ready() {
        if !pool.run_pending_job() {
            thread::yield_now();
        }
    }
    left + sub.wait().unwrap()
}

fn main() -> Result<()> {
    const N: u64 = 1_000_000;

    // Two workers against a recursion dozens of jobs wide: without the
    // drain-while-wait loop this would deadlock.
    let pool = Arc::new(WorkerPool::with_workers(2)?);

    let total = sum_range(&pool, 0, N);
    println!("sum of 0..{} = {}", N, total);
    assert_eq!(total, N * (N - 1) / 2);

    Ok(())
}
