//! Completion handle returned by job submission

use crate::core::error::{PoolError, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// The caller-facing side of a submitted job's result channel.
///
/// Each handle is paired with exactly one submitted job and is fulfilled
/// exactly once, when the job's closure returns or panics. The handle can be
/// polled with [`is_ready`](TaskHandle::is_ready) or
/// [`try_wait`](TaskHandle::try_wait) without blocking, or waited on with
/// [`wait`](TaskHandle::wait) / [`wait_timeout`](TaskHandle::wait_timeout).
///
/// Waiting blocks only the calling thread, never the pool. A job that waits
/// on handles of its own sub-jobs should interleave the wait with
/// [`WorkerPool::run_pending_job`](crate::pool::WorkerPool::run_pending_job)
/// to avoid exhausting the pool (see the pool documentation).
///
/// # Example
///
/// ```rust
/// use workpool::WorkerPool;
///
/// # fn main() -> workpool::Result<()> {
/// let pool = WorkerPool::with_workers(2)?;
/// let handle = pool.submit(|| 2 + 2)?;
/// assert_eq!(handle.wait()?, 4);
/// # Ok(())
/// # }
/// ```
pub struct TaskHandle<T> {
    outcome: Receiver<Result<T>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(outcome: Receiver<Result<T>>) -> Self {
        Self { outcome }
    }

    /// Block until the job finishes and return its result.
    ///
    /// # Errors
    ///
    /// - [`PoolError::JobPanicked`] if the job's closure panicked
    /// - [`PoolError::Disconnected`] if the job was dropped without running
    ///   (the pool was shut down while the job was still queued)
    pub fn wait(self) -> Result<T> {
        match self.outcome.recv() {
            Ok(result) => result,
            Err(_) => Err(PoolError::Disconnected),
        }
    }

    /// Block up to `timeout` for the job to finish.
    ///
    /// On [`PoolError::Timeout`] the handle remains usable and the wait can
    /// be retried.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T> {
        match self.outcome.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(PoolError::timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(PoolError::Disconnected),
        }
    }

    /// Take the result if the job has already finished, without blocking.
    ///
    /// Returns `None` while the job is still queued or executing.
    pub fn try_wait(&self) -> Option<Result<T>> {
        match self.outcome.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(PoolError::Disconnected)),
        }
    }

    /// Whether a result is ready to be taken.
    ///
    /// Unlike [`try_wait`](TaskHandle::try_wait) this never consumes the
    /// result. A job dropped unexecuted at pool shutdown still fulfills its
    /// channel (with [`PoolError::Disconnected`]), so a ready handle never
    /// blocks.
    pub fn is_ready(&self) -> bool {
        !self.outcome.is_empty()
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("ready", &!self.outcome.is_empty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn pair<T>() -> (crossbeam_channel::Sender<Result<T>>, TaskHandle<T>) {
        let (sender, receiver) = bounded(1);
        (sender, TaskHandle::new(receiver))
    }

    #[test]
    fn test_try_wait_pending() {
        let (_sender, handle) = pair::<u32>();
        assert!(!handle.is_ready());
        assert!(handle.try_wait().is_none());
    }

    #[test]
    fn test_wait_returns_value() {
        let (sender, handle) = pair();
        sender.send(Ok(7u32)).unwrap();

        assert!(handle.is_ready());
        assert_eq!(handle.wait().unwrap(), 7);
    }

    #[test]
    fn test_try_wait_takes_value_once() {
        let (sender, handle) = pair();
        sender.send(Ok(1u32)).unwrap();
        drop(sender);

        assert_eq!(handle.try_wait().unwrap().unwrap(), 1);
        // A second poll observes the exhausted channel.
        assert!(matches!(
            handle.try_wait(),
            Some(Err(PoolError::Disconnected))
        ));
    }

    #[test]
    fn test_dropped_sender_is_disconnected() {
        let (sender, handle) = pair::<u32>();
        drop(sender);

        assert!(matches!(handle.wait(), Err(PoolError::Disconnected)));
    }

    #[test]
    fn test_wait_timeout_elapses() {
        let (_sender, handle) = pair::<u32>();
        let result = handle.wait_timeout(Duration::from_millis(10));
        assert!(matches!(result, Err(PoolError::Timeout { timeout_ms: 10 })));
    }

    #[test]
    fn test_wait_timeout_retry_after_timeout() {
        let (sender, handle) = pair();
        assert!(handle.wait_timeout(Duration::from_millis(5)).is_err());

        sender.send(Ok(9u32)).unwrap();
        assert_eq!(handle.wait_timeout(Duration::from_millis(100)).unwrap(), 9);
    }
}
