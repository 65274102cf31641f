//! Пул потоков фиксированного размера с общей FIFO-очередью
//!
//! # Features
//! - N долгоживущих воркеров, очередь без ограничения размера
//! - Результат задачи через `ResultHandle` (блокирующее ожидание или `.await`)
//! - Паника в задаче приходит в handle как ошибка и не убивает воркер
//! - Graceful shutdown: приём закрывается, очередь дорабатывается, потоки join-ятся
//! - Метрики и состояние пула (Running / Draining / Stopped)
//!
//! ```no_run
//! use worker_pool::WorkerPool;
//!
//! let pool = WorkerPool::new(4)?;
//! let mut handle = pool.submit(|| 6 * 7)?;
//! assert_eq!(*handle.wait()?, 42);
//! pool.shutdown();
//! # Ok::<(), worker_pool::PoolError>(())
//! ```

pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod queue;
pub mod result;

pub use errors::{PoolError, PoolResult};
pub use handle::{ResultHandle, Task};
pub use model::{PoolMetrics, PoolState};
pub use pool::{Config, WorkerPool};
pub use queue::TaskQueue;
pub use result::TaskResult;
