//! # workpool
//!
//! A worker-pool scheduler built around a two-lock concurrent job queue.
//!
//! ## Features
//!
//! - **Worker Pool**: a fixed set of OS threads draining a shared FIFO of
//!   type-erased jobs, spawned eagerly and joined on shutdown
//! - **Completion Handles**: every submission returns a [`TaskHandle`] the
//!   caller can block on, poll, or wait on with a timeout
//! - **Two-Lock Queue**: producers and consumers synchronize on independent
//!   locks and never contend with each other; a single-mutex baseline queue
//!   is included for comparison
//! - **Cooperative Draining**: jobs that wait on sub-jobs can help work the
//!   queue via [`WorkerPool::run_pending_job`] instead of deadlocking the pool
//! - **Utilization Accounting**: per-worker wall/user/system time for the
//!   whole scheduling loop and for job execution, readable at any time
//!
//! ## Quick Start
//!
//! ```rust
//! use workpool::WorkerPool;
//!
//! # fn main() -> workpool::Result<()> {
//! // Create a pool; the worker count defaults to the hardware parallelism.
//! let pool = WorkerPool::with_workers(4)?;
//!
//! // Submit jobs and collect their completion handles.
//! let handles: Vec<_> = (0..10)
//!     .map(|i| pool.submit(move || i * i))
//!     .collect::<workpool::Result<_>>()?;
//!
//! let total: i32 = handles
//!     .into_iter()
//!     .map(|handle| handle.wait())
//!     .sum::<workpool::Result<i32>>()?;
//! assert_eq!(total, 285);
//! # Ok(())
//! # }
//! ```
//!
//! ## Worker Utilization
//!
//! ```rust
//! use workpool::WorkerPool;
//!
//! # fn main() -> workpool::Result<()> {
//! let pool = WorkerPool::with_workers(2)?;
//! pool.submit(|| std::thread::sleep(std::time::Duration::from_millis(10)))?
//!     .wait()?;
//!
//! for (id, usage) in pool.worker_stats().iter().enumerate() {
//!     println!(
//!         "worker {}: {:?} in the loop, {:?} executing, {:?} managing",
//!         id,
//!         usage.total.wall,
//!         usage.executing.wall,
//!         usage.managing().wall,
//!     );
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Using the queue directly
//!
//! ```rust
//! use workpool::queue::{JobFifo, LinkedQueue, PopError};
//!
//! let queue = LinkedQueue::new();
//! queue.push("job");
//! assert_eq!(queue.pop(), Ok("job"));
//! assert_eq!(queue.pop(), Err(PopError::Empty));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;

pub use crate::core::{BoxedJob, ClosureJob, Job, PoolError, Result, TaskHandle};
pub use crate::pool::{CpuTimes, PoolConfig, WorkerPool, WorkerUsage};
pub use crate::queue::{JobFifo, LinkedQueue, MutexQueue, PopError};
