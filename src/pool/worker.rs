//! Worker thread implementation and per-worker utilization accounting

use crate::core::{BoxedJob, PoolError, Result};
use crate::queue::{JobFifo, LinkedQueue, PopError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Wall/user/system time accumulated over some interval.
///
/// The user and system components are measured per thread via `getrusage`
/// and are reported as zero on platforms without per-thread rusage; the wall
/// component is always exact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuTimes {
    /// Elapsed wall-clock time
    pub wall: Duration,
    /// CPU time spent in user mode
    pub user: Duration,
    /// CPU time spent in kernel mode
    pub system: Duration,
}

impl CpuTimes {
    /// CPU time regardless of mode (user + system).
    pub fn cpu(&self) -> Duration {
        self.user + self.system
    }

    /// Component-wise difference, clamping at zero.
    pub fn saturating_sub(&self, other: &CpuTimes) -> CpuTimes {
        CpuTimes {
            wall: self.wall.saturating_sub(other.wall),
            user: self.user.saturating_sub(other.user),
            system: self.system.saturating_sub(other.system),
        }
    }
}

impl std::ops::AddAssign for CpuTimes {
    fn add_assign(&mut self, rhs: CpuTimes) {
        self.wall += rhs.wall;
        self.user += rhs.user;
        self.system += rhs.system;
    }
}

#[cfg(target_os = "linux")]
fn thread_rusage() -> (Duration, Duration) {
    fn from_timeval(tv: libc::timeval) -> Duration {
        Duration::new(tv.tv_sec.max(0) as u64, tv.tv_usec.max(0) as u32 * 1_000)
    }

    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // Safety: getrusage fills a complete rusage struct on success; on
    // failure the zeroed value is discarded.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_THREAD, usage.as_mut_ptr()) };
    if rc != 0 {
        return (Duration::ZERO, Duration::ZERO);
    }
    let usage = unsafe { usage.assume_init() };
    (from_timeval(usage.ru_utime), from_timeval(usage.ru_stime))
}

#[cfg(not(target_os = "linux"))]
fn thread_rusage() -> (Duration, Duration) {
    (Duration::ZERO, Duration::ZERO)
}

/// Measures wall and per-thread CPU time for the calling thread.
///
/// Only meaningful on the thread that created it: the rusage samples are
/// taken from the current thread.
pub(crate) struct CpuClock {
    wall: Instant,
    user: Duration,
    system: Duration,
}

impl CpuClock {
    pub(crate) fn start() -> Self {
        let (user, system) = thread_rusage();
        Self {
            wall: Instant::now(),
            user,
            system,
        }
    }

    /// Time elapsed since the clock was started or last lapped.
    pub(crate) fn elapsed(&self) -> CpuTimes {
        let (user, system) = thread_rusage();
        CpuTimes {
            wall: self.wall.elapsed(),
            user: user.saturating_sub(self.user),
            system: system.saturating_sub(self.system),
        }
    }

    /// Returns the elapsed interval and restarts the clock.
    pub(crate) fn lap(&mut self) -> CpuTimes {
        let elapsed = self.elapsed();
        self.wall = Instant::now();
        self.user += elapsed.user;
        self.system += elapsed.system;
        elapsed
    }
}

/// Utilization of a single worker thread.
///
/// `total` covers the whole scheduling loop; `executing` covers only the
/// intervals spent inside a job's `execute()`. The difference is the time
/// the worker spent managing the loop (polling the queue, yielding).
#[derive(Clone, Debug, Default)]
pub struct WorkerUsage {
    /// Time spent in the worker loop since the pool started
    pub total: CpuTimes,
    /// Time spent executing jobs
    pub executing: CpuTimes,
    /// Number of jobs that ran to completion
    pub jobs_processed: u64,
    /// Number of jobs that failed or panicked
    pub jobs_failed: u64,
}

impl WorkerUsage {
    /// Loop overhead: total time minus job-execution time.
    pub fn managing(&self) -> CpuTimes {
        self.total.saturating_sub(&self.executing)
    }
}

/// Fixed-size table of per-worker usage entries.
///
/// The key set (one entry per worker id) is allocated before any worker
/// starts and never changes afterwards, so lookups never race structural
/// mutation; only entry values synchronize. Each entry is written
/// exclusively by its owning worker and snapshot by any reader.
pub(crate) struct UsageTable {
    entries: Vec<RwLock<WorkerUsage>>,
}

impl UsageTable {
    pub(crate) fn with_workers(count: usize) -> Self {
        let mut entries = Vec::with_capacity(count);
        entries.resize_with(count, RwLock::default);
        Self { entries }
    }

    pub(crate) fn record(
        &self,
        worker_id: usize,
        loop_time: CpuTimes,
        executed: Option<(CpuTimes, bool)>,
    ) {
        if let Some(entry) = self.entries.get(worker_id) {
            let mut usage = entry.write();
            usage.total += loop_time;
            if let Some((execution_time, failed)) = executed {
                usage.executing += execution_time;
                if failed {
                    usage.jobs_failed += 1;
                } else {
                    usage.jobs_processed += 1;
                }
            }
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<WorkerUsage> {
        self.entries.iter().map(|entry| entry.read().clone()).collect()
    }
}

/// Runs one popped job, containing failures and panics.
///
/// Failures never propagate to the calling thread: the job wrapper routes
/// them to the submitter's completion handle, and this function only reports
/// whether the job failed so the caller can account for it. `worker` is
/// `None` when an external thread drains the queue via `run_pending_job`.
pub(crate) fn execute_job(worker: Option<usize>, job: &mut BoxedJob) -> bool {
    match job.execute() {
        Ok(()) => false,
        Err(e) => {
            match worker {
                Some(id) => log::warn!("worker {}: job '{}' failed: {}", id, job.job_type(), e),
                None => log::warn!("job '{}' failed: {}", job.job_type(), e),
            }
            true
        }
    }
}

/// A worker thread that drains the shared job queue.
#[derive(Debug)]
pub(crate) struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Spawns a worker running the scheduling loop.
    pub(crate) fn spawn(
        id: usize,
        name_prefix: &str,
        queue: Arc<LinkedQueue<BoxedJob>>,
        running: Arc<AtomicBool>,
        usage: Arc<UsageTable>,
    ) -> Result<Self> {
        let thread = thread::Builder::new()
            .name(format!("{}-{}", name_prefix, id))
            .spawn(move || Self::run(id, queue, running, usage))
            .map_err(|source| PoolError::spawn(id, source))?;

        Ok(Self {
            id,
            thread: Some(thread),
        })
    }

    /// Main worker loop.
    ///
    /// The loop polls the queue non-blockingly and yields on an empty queue
    /// rather than parking in `wait_pop`: the running flag is advisory, and
    /// a thread asleep in a blocking pop would not observe shutdown until
    /// the next push arrived.
    fn run(
        id: usize,
        queue: Arc<LinkedQueue<BoxedJob>>,
        running: Arc<AtomicBool>,
        usage: Arc<UsageTable>,
    ) {
        log::debug!("worker {} started", id);

        let mut clock = CpuClock::start();
        while running.load(Ordering::Acquire) {
            match queue.pop() {
                Ok(mut job) => {
                    let execution = CpuClock::start();
                    let failed = execute_job(Some(id), &mut job);
                    usage.record(id, clock.lap(), Some((execution.elapsed(), failed)));
                }
                Err(PopError::Empty) => {
                    usage.record(id, clock.lap(), None);
                    thread::yield_now();
                }
            }
        }

        log::debug!("worker {} stopped", id);
    }

    /// Joins the worker thread, blocking until its loop exits.
    pub(crate) fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            if let Err(payload) = thread.join() {
                log::error!(
                    "worker {} panicked: {}",
                    self.id,
                    crate::core::job::panic_message(payload.as_ref())
                );
            }
        }
    }
}
