//! Convenient re-exports for common types and traits

pub use crate::core::{BoxedJob, ClosureJob, Job, PoolError, Result, TaskHandle};
pub use crate::pool::{CpuTimes, PoolConfig, WorkerPool, WorkerUsage};
pub use crate::queue::{JobFifo, LinkedQueue, MutexQueue, PopError};
