//! Error types for the worker pool

/// Result type for worker pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors that can occur in the worker pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Failed to spawn a worker thread during pool construction
    #[error("Failed to spawn worker thread #{worker_id}")]
    Spawn {
        /// ID of the worker that failed to spawn
        worker_id: usize,
        /// Source IO error
        #[source]
        source: std::io::Error,
    },

    /// The submitted closure panicked while executing
    #[error("Job panicked: {message}")]
    JobPanicked {
        /// Panic message recovered from the panic payload
        message: String,
    },

    /// The job was dropped before it could produce a result
    #[error("Job was dropped before producing a result")]
    Disconnected,

    /// Waiting for a job result timed out
    #[error("Timed out after {timeout_ms}ms waiting for a job result")]
    Timeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// The pool has been shut down and no longer accepts jobs
    #[error("Worker pool '{pool_name}' is stopped")]
    Stopped {
        /// Name of the worker pool
        pool_name: String,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// A one-shot job was executed a second time
    #[error("Job already executed - cannot execute twice")]
    AlreadyExecuted,
}

impl PoolError {
    /// Create a spawn error
    pub fn spawn(worker_id: usize, source: std::io::Error) -> Self {
        PoolError::Spawn { worker_id, source }
    }

    /// Create a job panic error
    pub fn job_panicked(message: impl Into<String>) -> Self {
        PoolError::JobPanicked {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout: std::time::Duration) -> Self {
        PoolError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Create a stopped error
    pub fn stopped(pool_name: impl Into<String>) -> Self {
        PoolError::Stopped {
            pool_name: pool_name.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}
