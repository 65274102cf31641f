use worker_pool::{Config, PoolError, WorkerPool};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Instant,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};


fn main() -> Result<(), PoolError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let now = Instant::now();
    let pool = WorkerPool::with_config(Config::cpu_bound().with_thread_name_prefix("demo"))?;
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..1_000_000 {
        let counter = counter.clone();
        pool.execute(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })?;
    }

    let mut total = pool.submit(|| (0..1_000u64).sum::<u64>())?;
    let sum = *total.wait()?;
    info!(sum, "computed on pool");

    pool.shutdown();
    info!(
        executed = counter.load(Ordering::Relaxed),
        elapsed = ?now.elapsed(),
        "done"
    );
    Ok(())
}
