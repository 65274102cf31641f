use super::{
    errors::{panic_message, PoolError, PoolResult},
    handle::{
        Task,
        ResultHandle,
    },
    model::{
        PoolMetrics,
        PoolState,
    },
    queue::TaskQueue,
};
use std::{
    fmt,
    future::Future,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle, ThreadId},
    time::Duration,
};
use crossbeam::utils::CachePadded;
use tracing::{debug, error, info, trace, warn};


/// Конфигурация пула потоков
#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: usize,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name_prefix: "worker".to_string(),
            stack_size: None,
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        Self {
            num_threads: num_cpus::get(),
            ..Default::default()
        }
    }

    /// Для блокирующих I/O задач: потоков вдвое больше, чем ядер
    pub fn io_bound() -> Self {
        Self {
            num_threads: num_cpus::get() * 2,
            ..Default::default()
        }
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Ноль воркеров отклоняется, а не округляется до одного
    pub fn validate(&self) -> PoolResult<()> {
        if self.num_threads == 0 {
            return Err(PoolError::InvalidConfiguration(
                "num_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}


struct Shared {
    queue: TaskQueue,
    active_tasks: CachePadded<AtomicUsize>,
    total_submitted: CachePadded<AtomicUsize>,
    completed_tasks: CachePadded<AtomicUsize>,
    failed_tasks: CachePadded<AtomicUsize>,
}

impl Shared {
    fn new() -> Self {
        Self {
            queue: TaskQueue::new(),
            active_tasks: CachePadded::new(AtomicUsize::new(0)),
            total_submitted: CachePadded::new(AtomicUsize::new(0)),
            completed_tasks: CachePadded::new(AtomicUsize::new(0)),
            failed_tasks: CachePadded::new(AtomicUsize::new(0)),
        }
    }
}


/// Пул из фиксированного числа потоков над общей FIFO-очередью.
///
/// Потоки принадлежат только пулу; `Drop` выполняет тот же `shutdown`:
/// новые задачи отклоняются, очередь дорабатывается, все воркеры join-ятся.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_ids: Vec<ThreadId>,
    config: Config,
}

impl WorkerPool {
    pub fn new(num_threads: usize) -> PoolResult<Self> {
        let config = Config {
            num_threads,
            ..Default::default()
        };
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> PoolResult<Self> {
        config.validate()?;

        let shared = Arc::new(Shared::new());
        let mut workers = Vec::with_capacity(config.num_threads);

        for index in 0..config.num_threads {
            let mut builder = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, index));
            if let Some(size) = config.stack_size {
                builder = builder.stack_size(size);
            }

            let worker_shared = shared.clone();
            shared.queue.worker_started();

            match builder.spawn(move || worker_loop(worker_shared, index)) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    shared.queue.worker_exited();
                    error!(worker = index, error = %e, "failed to spawn worker thread");
                    // Уже запущенные воркеры останавливаем до возврата ошибки
                    shared.queue.close();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(PoolError::Spawn(e.to_string()));
                }
            }
        }

        info!(threads = config.num_threads, "worker pool started");

        let worker_ids = workers.iter().map(|handle| handle.thread().id()).collect();
        Ok(Self {
            shared,
            workers: Mutex::new(workers),
            worker_ids,
            config,
        })
    }

    #[inline]
    fn push_task(&self, task: Task) -> PoolResult<()> {
        self.shared.total_submitted.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.shared.queue.push(task) {
            self.shared.total_submitted.fetch_sub(1, Ordering::Relaxed);
            debug!("submission rejected: pool is shutting down");
            return Err(e);
        }
        trace!("task submitted");
        Ok(())
    }

    /// Ставит `f` в очередь и сразу возвращает handle на результат.
    ///
    /// Паника внутри `f` приходит в handle как `PoolError::TaskPanicked`,
    /// воркер при этом продолжает работу.
    pub fn submit<F, T>(&self, f: F) -> PoolResult<ResultHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, handle) = ResultHandle::channel();

        self.push_task(Box::new(move || {
            match panic::catch_unwind(AssertUnwindSafe(f)) {
                Ok(value) => {
                    let _ = tx.send(Ok(value));
                }
                Err(payload) => {
                    let _ = tx.send(Err(PoolError::TaskPanicked(panic_message(&*payload))));
                    // учёт и лог паники делает цикл воркера
                    panic::resume_unwind(payload);
                }
            }
        }))?;

        Ok(handle)
    }

    /// Fire-and-forget: без handle, паника только логируется
    pub fn execute<F>(&self, f: F) -> PoolResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.push_task(Box::new(f))
    }

    /// Future выполняется на воркере через `block_on` и занимает его до завершения
    pub fn spawn<Fut, T>(&self, fut: Fut) -> PoolResult<ResultHandle<T>>
    where
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.submit(move || futures::executor::block_on(fut))
    }

    fn on_worker_thread(&self) -> bool {
        self.worker_ids.contains(&thread::current().id())
    }

    /// Ждёт выполнения всех принятых задач, не останавливая пул
    pub fn wait_idle(&self) {
        if self.on_worker_thread() {
            warn!("wait_idle called from a pool worker; returning immediately");
            return;
        }
        self.shared.queue.wait_drained();
    }

    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        if self.on_worker_thread() {
            warn!("wait_idle_timeout called from a pool worker; returning immediately");
            return false;
        }
        self.shared.queue.wait_drained_timeout(timeout)
    }

    /// Останавливает приём задач, дорабатывает очередь и join-ит всех воркеров.
    ///
    /// Любой вызов вне пула возвращается только после выхода всех воркеров,
    /// в том числе повторный или параллельный. Из задачи самого пула
    /// вызов лишь закрывает приём: воркер не может дождаться сам себя.
    pub fn shutdown(&self) {
        self.begin_shutdown();
        if self.on_worker_thread() {
            warn!("shutdown called from a pool worker; not waiting for the pool to stop");
            return;
        }
        self.join_workers();
    }

    /// Как `shutdown`, но ждёт очередь не дольше `timeout`.
    /// При `false` пул остаётся в `Draining`, воркеры join-ятся позже в `shutdown` или `Drop`.
    pub fn shutdown_timeout(&self, timeout: Duration) -> bool {
        self.begin_shutdown();
        if self.on_worker_thread() {
            warn!("shutdown_timeout called from a pool worker; not waiting for the pool to stop");
            return false;
        }
        if !self.shared.queue.wait_drained_timeout(timeout) {
            warn!(
                queued = self.shared.queue.len(),
                "worker pool did not drain before timeout"
            );
            return false;
        }
        self.join_workers();
        true
    }

    fn begin_shutdown(&self) {
        if self.shared.queue.close() {
            info!(queued = self.shared.queue.len(), "shutting down worker pool");
        }
    }

    fn join_workers(&self) {
        let handles = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let joined = !handles.is_empty();
        for handle in handles {
            if handle.join().is_err() {
                error!("worker thread terminated abnormally");
            }
        }
        // Handles мог забрать параллельный shutdown: ждём выхода воркеров по счётчику
        self.shared.queue.wait_stopped();
        if joined {
            info!("worker pool stopped");
        }
    }

    pub fn state(&self) -> PoolState {
        if !self.shared.queue.is_closed() {
            PoolState::Running
        } else if self.shared.queue.live_workers() == 0 {
            PoolState::Stopped
        } else {
            PoolState::Draining
        }
    }

    #[inline]
    pub fn num_threads(&self) -> usize {
        self.config.num_threads
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        let live_workers = self.shared.queue.live_workers();
        let active_tasks = self.shared.active_tasks.load(Ordering::Relaxed);
        PoolMetrics {
            num_workers: self.config.num_threads,
            live_workers,
            active_tasks,
            idle_workers: live_workers.saturating_sub(active_tasks),
            queued_tasks: self.shared.queue.len(),
            total_submitted: self.shared.total_submitted.load(Ordering::Relaxed),
            completed_tasks: self.shared.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.shared.failed_tasks.load(Ordering::Relaxed),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}


// Цикл воркера: ждать, взять, выполнить вне замка, повторить.
// Паника задачи ловится здесь и не убивает поток.
fn worker_loop(shared: Arc<Shared>, index: usize) {
    debug!(worker = index, "worker started");

    while let Some(task) = shared.queue.pop_blocking() {
        shared.active_tasks.fetch_add(1, Ordering::Relaxed);

        match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(()) => {
                shared.completed_tasks.fetch_add(1, Ordering::Relaxed);
                trace!(worker = index, "task completed");
            }
            Err(payload) => {
                shared.failed_tasks.fetch_add(1, Ordering::Relaxed);
                warn!(worker = index, error = %panic_message(&*payload), "task panicked");
            }
        }

        shared.active_tasks.fetch_sub(1, Ordering::Relaxed);
        shared.queue.task_done();
    }

    shared.queue.worker_exited();
    debug!(worker = index, "worker exiting");
}
