//! Worker pool: thread lifecycle, scheduling loop, and utilization accounting

pub mod thread_pool;
pub mod worker;

pub use thread_pool::{PoolConfig, WorkerPool};
pub use worker::{CpuTimes, WorkerUsage};
