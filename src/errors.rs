use thiserror::Error;

/// Failure to bring a pool up.
#[derive(Debug, Error)]
pub enum CreateError {
    #[error("invalid pool configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// An OS thread could not be started. Threads spawned before the
    /// failure have already been shut down and joined.
    #[error("failed to spawn pool thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum SubmitError {
    /// The pool is shutting down; the task was dropped without running.
    #[error("pool is shut down, task rejected")]
    Rejected,
}

/// Outcome of a task submitted through [`crate::ThreadPool::submit_with_handle`].
#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone, Error)]
pub enum SpawnError {
    #[error("task panicked: {0}")]
    Panic(String),
    #[error("task rejected by a shut down pool")]
    Rejected,
    #[error("result channel closed before completion")]
    ChannelClosed,
    #[error("timed out waiting for task result")]
    Timeout,
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("failed to parse {key}='{value}': {error}")]
    Parse {
        key: String,
        value: String,
        error: String,
    },
}
