//! Самомасштабируемый пул потоков с ограниченной очередью задач
//!
//! # Features
//! - Bounded FIFO queue with producer backpressure
//! - Worker count kept within `[min_workers, max_workers]` by a manager thread
//! - Grows on backlog, shrinks on low occupancy
//! - Graceful shutdown that joins every thread before releasing the queue
//! - Optional result handles, awaitable or blocking
//! - Метрики и конфигурация из окружения

pub mod config;
pub mod errors;
pub mod handle;
pub mod manager;
pub mod model;
pub mod pool;
pub mod queue;
pub mod registry;
mod worker;

pub use config::Config;
pub use errors::{ConfigError, CreateError, SpawnError, SubmitError};
pub use handle::{JoinHandle, SpawnResult};
pub use model::PoolMetrics;
pub use pool::{Submitter, ThreadPool};
