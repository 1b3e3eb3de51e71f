//! Worker pool implementation

use crate::core::job::panic_message;
use crate::core::{BoxedJob, Job, PoolError, Result, TaskHandle};
use crate::pool::worker::{execute_job, UsageTable, Worker, WorkerUsage};
use crate::queue::{JobFifo, LinkedQueue, PopError};
use crossbeam_channel::Sender;
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuration for a worker pool
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of worker threads (0 = number of CPUs)
    pub num_workers: usize,
    /// Thread name prefix, also used as the pool's name in errors and logs
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            thread_name_prefix: "worker".to_string(),
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with the specified number of workers
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: if num_workers == 0 {
                num_cpus::get()
            } else {
                num_workers
            },
            ..Default::default()
        }
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(PoolError::invalid_config(
                "num_workers",
                "Number of workers must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// A job wrapper pairing a user closure with its completion channel.
///
/// Panics are caught here, at the job boundary, and delivered through the
/// completion handle instead of unwinding into the worker thread. If the
/// job is dropped without executing (pool teardown with work still queued),
/// the channel is fulfilled with [`PoolError::Disconnected`] so the waiting
/// caller never hangs.
struct CompletingJob<F, T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    closure: Option<F>,
    outcome: Option<Sender<Result<T>>>,
}

impl<F, T> CompletingJob<F, T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    fn new(closure: F, outcome: Sender<Result<T>>) -> Self {
        Self {
            closure: Some(closure),
            outcome: Some(outcome),
        }
    }
}

impl<F, T> Job for CompletingJob<F, T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    fn execute(&mut self) -> Result<()> {
        let closure = self.closure.take().ok_or(PoolError::AlreadyExecuted)?;
        let outcome = self.outcome.take().ok_or(PoolError::AlreadyExecuted)?;

        match catch_unwind(AssertUnwindSafe(closure)) {
            Ok(value) => {
                // The caller may have dropped its handle; a lost send is fine.
                let _ = outcome.send(Ok(value));
                Ok(())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                let _ = outcome.send(Err(PoolError::job_panicked(message.clone())));
                Err(PoolError::job_panicked(message))
            }
        }
    }

    fn job_type(&self) -> &str {
        "CompletingJob"
    }
}

impl<F, T> Drop for CompletingJob<F, T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    fn drop(&mut self) {
        if let Some(outcome) = self.outcome.take() {
            let _ = outcome.send(Err(PoolError::Disconnected));
        }
    }
}

/// A fixed-size pool of worker threads draining a shared job queue.
///
/// Workers are spawned eagerly at construction and joined at shutdown.
/// Jobs are arbitrary closures submitted with [`submit`](WorkerPool::submit),
/// which returns a [`TaskHandle`] the caller can wait on or poll.
///
/// # Shutdown
///
/// [`shutdown`](WorkerPool::shutdown) (also run on drop) flips the shared
/// running flag and joins every worker. An in-flight job always runs to
/// completion first; jobs still queued are dropped without executing, and
/// their handles report [`PoolError::Disconnected`].
///
/// # Avoiding self-deadlock
///
/// A job that submits sub-jobs and blocks on their handles can deadlock the
/// pool once every worker is blocked the same way. Such a job should help
/// drain the queue while it waits:
///
/// ```rust
/// use std::sync::Arc;
/// use workpool::WorkerPool;
///
/// # fn main() -> workpool::Result<()> {
/// let pool = Arc::new(WorkerPool::with_workers(2)?);
///
/// let inner = Arc::clone(&pool);
/// let handle = pool.submit(move || {
///     let sub = inner.submit(|| 21).unwrap();
///     // Work the queue instead of just occupying a worker slot.
///     while !sub.is_ready() {
///         if !inner.run_pending_job() {
///             std::thread::yield_now();
///         }
///     }
///     sub.wait().unwrap() * 2
/// })?;
///
/// assert_eq!(handle.wait()?, 42);
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool {
    config: PoolConfig,
    queue: Arc<LinkedQueue<BoxedJob>>,
    running: Arc<AtomicBool>,
    usage: Arc<UsageTable>,
    workers: RwLock<Vec<Worker>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool with one worker per hardware thread
    pub fn new() -> Result<Self> {
        Self::with_config(PoolConfig::default())
    }

    /// Create a pool with the specified number of workers
    pub fn with_workers(num_workers: usize) -> Result<Self> {
        Self::with_config(PoolConfig::new(num_workers))
    }

    /// Create a pool with custom configuration
    ///
    /// All workers are spawned before this returns. Their usage entries are
    /// allocated first, so no worker ever races the creation of its own
    /// entry. If spawning fails partway, the workers already started are
    /// stopped and joined and the error is returned; a pool is never left
    /// partially running.
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let count = config.num_workers;
        let queue = Arc::new(LinkedQueue::new());
        let running = Arc::new(AtomicBool::new(true));
        let usage = Arc::new(UsageTable::with_workers(count));

        let mut workers = Vec::with_capacity(count);
        for id in 0..count {
            match Worker::spawn(
                id,
                &config.thread_name_prefix,
                Arc::clone(&queue),
                Arc::clone(&running),
                Arc::clone(&usage),
            ) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    log::error!(
                        "pool '{}': spawning worker {} of {} failed, unwinding",
                        config.thread_name_prefix,
                        id,
                        count
                    );
                    running.store(false, Ordering::Release);
                    for worker in workers {
                        worker.join();
                    }
                    return Err(e);
                }
            }
        }

        log::debug!(
            "pool '{}' started with {} workers",
            config.thread_name_prefix,
            count
        );

        Ok(Self {
            config,
            queue,
            running,
            usage,
            workers: RwLock::new(workers),
        })
    }

    /// Submit a closure and get a handle to its eventual result
    ///
    /// The closure is queued immediately and the call never blocks on
    /// execution; waiting happens on the returned [`TaskHandle`] and blocks
    /// only the waiting thread.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Stopped`] after [`shutdown`](WorkerPool::shutdown);
    /// a job accepted then could never complete.
    pub fn submit<F, T>(&self, job: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if !self.running.load(Ordering::Acquire) {
            return Err(PoolError::stopped(&self.config.thread_name_prefix));
        }

        let (sender, receiver) = crossbeam_channel::bounded(1);
        self.queue
            .push(Box::new(CompletingJob::new(job, sender)) as BoxedJob);
        Ok(TaskHandle::new(receiver))
    }

    /// Make one non-blocking attempt to pop and execute a pending job
    ///
    /// Returns `false` if the queue was empty. This is the cooperative
    /// drain-while-wait primitive: a thread blocked on a [`TaskHandle`] from
    /// inside a job should call this in its wait loop so it helps the pool
    /// make progress instead of just occupying a worker slot (see the type
    /// docs for an example). A failure in the executed job is delivered to
    /// that job's own completion handle, never to this caller.
    pub fn run_pending_job(&self) -> bool {
        match self.queue.pop() {
            Ok(mut job) => {
                // Executed outside any worker loop: no usage entry to charge.
                execute_job(None, &mut job);
                true
            }
            Err(PopError::Empty) => false,
        }
    }

    /// Get the number of worker threads
    pub fn num_workers(&self) -> usize {
        self.config.num_workers
    }

    /// Check whether the pool is accepting and executing jobs
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Snapshot the per-worker utilization table
    ///
    /// Safe to call at any time, concurrently with workers updating their
    /// own entries. The returned vector has one entry per worker, indexed by
    /// worker id, for the pool's whole lifetime.
    pub fn worker_stats(&self) -> Vec<WorkerUsage> {
        self.usage.snapshot()
    }

    /// Stop the pool and wait for every worker to exit
    ///
    /// 1. Flips the running flag so no new jobs are accepted and workers
    ///    leave their loop at the next iteration.
    /// 2. Joins every worker; an in-flight job finishes first.
    /// 3. Drops any jobs still queued without executing them; their
    ///    completion handles report [`PoolError::Disconnected`].
    ///
    /// Calling this more than once is harmless.
    pub fn shutdown(&self) {
        if self
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let workers = std::mem::take(&mut *self.workers.write());
        for worker in workers {
            worker.join();
        }

        // Dropping a queued job fulfills its completion handle with
        // `Disconnected`, so stranded callers unblock here instead of at the
        // pool's drop.
        let mut discarded = 0usize;
        while let Ok(job) = self.queue.pop() {
            drop(job);
            discarded += 1;
        }
        if discarded > 0 {
            log::warn!(
                "pool '{}': discarded {} queued jobs at shutdown",
                self.config.thread_name_prefix,
                discarded
            );
        }

        log::debug!("pool '{}' stopped", self.config.thread_name_prefix);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_config_defaults() {
        let config = PoolConfig::default();
        assert!(config.num_workers >= 1);
        assert_eq!(config.thread_name_prefix, "worker");
    }

    #[test]
    fn test_config_zero_maps_to_cpu_count() {
        let config = PoolConfig::new(0);
        assert_eq!(config.num_workers, num_cpus::get());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validate_rejects_zero_workers() {
        let config = PoolConfig {
            num_workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PoolError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_pool_executes_submitted_closure() {
        let pool = WorkerPool::with_workers(2).unwrap();
        let handle = pool.submit(|| 2 + 2).unwrap();
        assert_eq!(handle.wait().unwrap(), 4);
    }

    #[test]
    fn test_pool_runs_many_jobs() {
        let pool = WorkerPool::with_workers(4).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap()
            })
            .collect();
        for handle in handles {
            handle.wait().unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let pool = WorkerPool::with_workers(1).unwrap();
        pool.shutdown();

        assert!(matches!(
            pool.submit(|| ()),
            Err(PoolError::Stopped { .. })
        ));
    }

    #[test]
    fn test_double_shutdown_is_harmless() {
        let pool = WorkerPool::with_workers(2).unwrap();
        pool.shutdown();
        pool.shutdown();
        assert!(!pool.is_running());
    }

    #[test]
    fn test_run_pending_job_on_empty_queue() {
        let pool = WorkerPool::with_workers(1).unwrap();
        pool.shutdown();
        assert!(!pool.run_pending_job());
    }

    #[test]
    fn test_worker_stats_len_matches_workers() {
        let pool = WorkerPool::with_workers(3).unwrap();
        assert_eq!(pool.worker_stats().len(), 3);
        assert_eq!(pool.num_workers(), 3);
    }

    #[test]
    fn test_completing_job_drop_fulfills_handle() {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let job = CompletingJob::new(|| 1u32, sender);
        drop(job);

        let handle = TaskHandle::new(receiver);
        assert!(matches!(handle.wait(), Err(PoolError::Disconnected)));
    }

    #[test]
    fn test_panicking_job_does_not_kill_worker() {
        let pool = WorkerPool::with_workers(1).unwrap();

        let failing = pool
            .submit(|| -> u32 { panic!("intentional panic") })
            .unwrap();
        assert!(matches!(
            failing.wait(),
            Err(PoolError::JobPanicked { .. })
        ));

        // The single worker must still be alive to run this.
        let handle = pool.submit(|| 7).unwrap();
        assert_eq!(handle.wait_timeout(Duration::from_secs(5)).unwrap(), 7);
    }
}
