use super::errors::ConfigError;
use std::{
    str::FromStr,
    time::Duration,
};

/// Default number of workers the manager adds or retires per tick.
pub const DEFAULT_SCALING_STEP: usize = 2;

/// Default period between two manager ticks.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(3);


/// Конфигурация пула потоков
#[derive(Debug, Clone)]
pub struct Config {
    pub min_workers: usize,
    pub max_workers: usize,
    pub queue_capacity: usize,
    pub scaling_step: usize,
    pub monitor_interval: Duration,
    /// Prefix for worker thread names, suffixed with the worker id.
    pub thread_name: String,
}

impl Default for Config {
    fn default() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            min_workers: num_cpus,
            max_workers: num_cpus * 2, // Для I/O-bound задач
            queue_capacity: num_cpus * 20,
            scaling_step: DEFAULT_SCALING_STEP,
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            thread_name: "elastic-worker".to_string(),
        }
    }
}

impl Config {
    pub fn new(min_workers: usize, max_workers: usize, queue_capacity: usize) -> Self {
        Self {
            min_workers,
            max_workers,
            queue_capacity,
            ..Default::default()
        }
    }

    pub fn cpu_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            min_workers: num_cpus,
            max_workers: num_cpus,
            queue_capacity: num_cpus * 10,
            ..Default::default()
        }
    }

    pub fn io_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            min_workers: num_cpus,
            max_workers: num_cpus * 4,
            queue_capacity: num_cpus * 40,
            ..Default::default()
        }
    }

    pub fn with_scaling_step(mut self, step: usize) -> Self {
        self.scaling_step = step;
        self
    }

    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }

    pub fn with_thread_name<S: Into<String>>(mut self, name: S) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Load configuration from `POOL_*` environment variables, falling back
    /// to [`Config::default`] for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let interval_ms = env_parse(
            "POOL_MONITOR_INTERVAL_MS",
            defaults.monitor_interval.as_millis() as u64,
        )?;

        let config = Self {
            min_workers: env_parse("POOL_MIN_WORKERS", defaults.min_workers)?,
            max_workers: env_parse("POOL_MAX_WORKERS", defaults.max_workers)?,
            queue_capacity: env_parse("POOL_QUEUE_CAPACITY", defaults.queue_capacity)?,
            scaling_step: env_parse("POOL_SCALING_STEP", defaults.scaling_step)?,
            monitor_interval: Duration::from_millis(interval_ms),
            thread_name: std::env::var("POOL_THREAD_NAME")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.thread_name),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_workers == 0 {
            return Err(invalid("min_workers", "must be at least 1"));
        }
        if self.max_workers < self.min_workers {
            return Err(invalid(
                "max_workers",
                format!("{} is below min_workers {}", self.max_workers, self.min_workers),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(invalid("queue_capacity", "must be at least 1"));
        }
        if self.scaling_step == 0 {
            return Err(invalid("scaling_step", "must be at least 1"));
        }
        if self.monitor_interval.is_zero() {
            return Err(invalid("monitor_interval", "must be non-zero"));
        }
        if self.thread_name.as_bytes().contains(&0) {
            return Err(invalid("thread_name", "must not contain null bytes"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.into(),
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value.parse().map_err(|e: T::Err| ConfigError::Parse {
            key: key.to_string(),
            error: e.to_string(),
            value,
        }),
        _ => Ok(default),
    }
}
