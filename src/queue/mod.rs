//! Concurrent FIFO queues for handing jobs between threads.
//!
//! Two implementations share one contract:
//!
//! - [`LinkedQueue`]: a linked-list FIFO whose head (pop side) and tail
//!   (push side) are guarded by independent locks, so a producer and a
//!   consumer never contend with each other (default, used by the pool)
//! - [`MutexQueue`]: a single-mutex `VecDeque` with identical semantics,
//!   kept as the performance baseline the two-lock design is measured
//!   against
//!
//! Both are usable by any number of producer and consumer threads. The
//! [`JobFifo`] trait abstracts over them so tests and benchmarks can drive
//! either through one interface.

mod linked;
mod mutex;

pub use linked::LinkedQueue;
pub use mutex::MutexQueue;

/// Errors returned by non-blocking queue operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PopError {
    /// The queue held no element at the instant of the pop.
    ///
    /// Expected and recoverable: retry, yield, or fall back to
    /// [`JobFifo::wait_pop`].
    #[error("queue is empty")]
    Empty,
}

/// Common contract of the queue implementations.
///
/// # Thread Safety
///
/// All implementations are `Send + Sync`; every method takes `&self` and may
/// be called from any number of threads concurrently.
pub trait JobFifo<T: Send>: Send + Sync {
    /// Appends `value` at the back of the queue and wakes one waiting
    /// consumer. Never blocks beyond the push-side critical section.
    fn push(&self, value: T);

    /// Removes and returns the front element without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`PopError::Empty`] if no element was available.
    fn pop(&self) -> Result<T, PopError>;

    /// Removes and returns the front element, suspending the calling thread
    /// until one is available.
    ///
    /// This can block indefinitely on a queue that never receives another
    /// push; callers that must also observe an external shutdown flag should
    /// use [`pop`](JobFifo::pop) in a re-check loop instead.
    fn wait_pop(&self) -> T;

    /// Whether the queue held no element at the instant of the check.
    ///
    /// The answer is only valid for that instant; concurrent pushes and pops
    /// may invalidate it immediately.
    fn is_empty(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    // Both implementations honor the same contract; exercise them through
    // the trait the way the benchmark harness does.
    fn fifo_contract<Q: JobFifo<i32> + 'static>(queue: Q) {
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), Err(PopError::Empty));

        queue.push(0);
        queue.push(1);
        assert_eq!(queue.pop(), Ok(0));
        queue.push(2);
        assert_eq!(queue.pop(), Ok(1));
        assert_eq!(queue.pop(), Ok(2));

        assert!(queue.is_empty());
        assert_eq!(queue.pop(), Err(PopError::Empty));

        let queue = Arc::new(queue);
        let reader = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for expected in 0..100 {
                    assert_eq!(queue.wait_pop(), expected);
                }
            })
        };
        let writer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..100 {
                    queue.push(i);
                }
            })
        };

        reader.join().unwrap();
        writer.join().unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_linked_queue_contract() {
        fifo_contract(LinkedQueue::new());
    }

    #[test]
    fn test_mutex_queue_contract() {
        fifo_contract(MutexQueue::new());
    }
}
