//! Общая FIFO-очередь задач.
//!
//! Очередь и флаг остановки образуют одну критическую секцию под одним мьютексом.
//! Потребители ждут на `available` с повторной проверкой условия в цикле,
//! так что ложные пробуждения и пропущенные уведомления безопасны.

use super::{
    errors::PoolError,
    handle::Task,
};
use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};


struct QueueState {
    tasks: VecDeque<Task>,
    stopping: bool,
    /// Принятые, но ещё не завершённые задачи (в очереди + выполняются)
    in_flight: usize,
    /// Воркеры, ещё не вышедшие из цикла
    live_workers: usize,
}

pub struct TaskQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    drained: Condvar,
    stopped: Condvar,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                stopping: false,
                in_flight: 0,
                live_workers: 0,
            }),
            available: Condvar::new(),
            drained: Condvar::new(),
            stopped: Condvar::new(),
        }
    }

    // Под замком пользовательский код не выполняется, отравление безопасно игнорировать
    #[inline]
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Кладёт задачу в хвост и будит одного ожидающего воркера.
    ///
    /// После `close` задача отклоняется с `PoolError::ShuttingDown` и уничтожается.
    pub fn push(&self, task: Task) -> Result<(), PoolError> {
        {
            let mut state = self.lock();
            if state.stopping {
                return Err(PoolError::ShuttingDown);
            }
            state.tasks.push_back(task);
            state.in_flight += 1;
        }
        self.available.notify_one();
        Ok(())
    }

    /// Блокирует до появления задачи. `None` означает: очередь закрыта и пуста, воркеру пора выходить.
    pub fn pop_blocking(&self) -> Option<Task> {
        let mut state = self.lock();
        loop {
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            if state.stopping {
                return None;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Отмечает завершение задачи, полученной через `pop_blocking`
    pub fn task_done(&self) {
        let idle = {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.in_flight == 0
        };
        if idle {
            self.drained.notify_all();
        }
    }

    /// Выставляет флаг остановки и будит всех воркеров.
    /// Возвращает `true` только для первого вызова.
    pub fn close(&self) -> bool {
        let first = {
            let mut state = self.lock();
            let first = !state.stopping;
            state.stopping = true;
            first
        };
        self.available.notify_all();
        first
    }

    /// Ждёт, пока все принятые задачи не будут выполнены
    pub fn wait_drained(&self) {
        let mut state = self.lock();
        while state.in_flight > 0 {
            state = self
                .drained
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// То же с таймаутом; `false`, если время вышло раньше
    pub fn wait_drained_timeout(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .drained
            .wait_timeout_while(state, timeout, |s| s.in_flight > 0)
            .unwrap_or_else(PoisonError::into_inner);
        state.in_flight == 0
    }

    /// Регистрирует потребителя до запуска его потока
    pub fn worker_started(&self) {
        self.lock().live_workers += 1;
    }

    /// Потребитель вышел из цикла; последний будит всех в `wait_stopped`
    pub fn worker_exited(&self) {
        let last = {
            let mut state = self.lock();
            state.live_workers = state.live_workers.saturating_sub(1);
            state.live_workers == 0
        };
        if last {
            self.stopped.notify_all();
        }
    }

    /// Ждёт, пока все зарегистрированные потребители не выйдут
    pub fn wait_stopped(&self) {
        let mut state = self.lock();
        while state.live_workers > 0 {
            state = self
                .stopped
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    #[inline]
    pub fn live_workers(&self) -> usize {
        self.lock().live_workers
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.lock().stopping
    }

    #[inline]
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }
}
