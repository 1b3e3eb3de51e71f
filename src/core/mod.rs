//! Core types: jobs, completion handles, and errors

pub mod error;
pub mod handle;
pub mod job;

pub use error::{PoolError, Result};
pub use handle::TaskHandle;
pub use job::{BoxedJob, ClosureJob, Job};
