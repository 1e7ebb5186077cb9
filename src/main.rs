use elastic_pool::{Config, ThreadPool};
use std::{
    thread,
    time::{Duration, Instant},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};


fn work(number: &mut u64) {
    let current = thread::current();
    tracing::info!(
        thread = current.name().unwrap_or("unnamed"),
        number = *number,
        "working"
    );
    thread::sleep(Duration::from_millis(200));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "elastic_pool=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = if std::env::var("POOL_MIN_WORKERS").is_ok() {
        Config::from_env()?
    } else {
        Config::new(3, 10, 100).with_monitor_interval(Duration::from_millis(500))
    };

    let now = Instant::now();
    let pool = ThreadPool::with_config(config)?;

    for i in 0..100 {
        pool.submit(work, i + 100)?;
    }

    while pool.metrics().queued_tasks > 0 {
        let metrics = pool.metrics();
        tracing::info!(
            live = metrics.live_workers,
            busy = metrics.busy_workers,
            queued = metrics.queued_tasks,
            utilization = metrics.utilization(),
            "pool status"
        );
        thread::sleep(Duration::from_millis(250));
    }

    pool.destroy();
    tracing::info!(elapsed = ?now.elapsed(), "done");
    Ok(())
}
