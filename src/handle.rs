use super::{
    errors::PoolError,
    result::TaskResult,
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll}
};
use tokio::{
    sync::oneshot,
    time::Duration,
};


/// Единица работы в очереди: вызывается ровно один раз, без аргументов
pub type Task = Box<dyn FnOnce() + Send + 'static>;


/// Handle на результат задачи.
///
/// Сторона записи (`oneshot::Sender`) живёт внутри задачи, сторона чтения здесь.
/// Полученный результат кэшируется, поэтому `wait` можно вызывать повторно.
pub struct ResultHandle<T> {
    receiver: Option<oneshot::Receiver<TaskResult<T>>>,
    outcome: Option<Box<TaskResult<T>>>,
}

impl<T> ResultHandle<T> {

    pub fn new(receiver: oneshot::Receiver<TaskResult<T>>) -> Self {
        Self {
            receiver: Some(receiver),
            outcome: None,
        }
    }

    /// Пара (запись, чтение) для одной задачи
    pub fn channel() -> (oneshot::Sender<TaskResult<T>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self::new(rx))
    }

    /// Блокирует поток до завершения задачи.
    ///
    /// Повторный вызов возвращает тот же результат, задача не перезапускается.
    /// Не зависит от рантайма; внутри async-кода лучше `.await`, чтобы не занимать поток.
    pub fn wait(&mut self) -> Result<&T, PoolError> {
        if self.outcome.is_none() {
            let outcome = match self.receiver.take() {
                Some(rx) => futures::executor::block_on(rx).unwrap_or(Err(PoolError::ResultLost)),
                None => Err(PoolError::ResultLost),
            };
            self.outcome = Some(Box::new(outcome));
        }
        self.cached()
    }

    /// Неблокирующая проверка; `None`, пока задача не завершилась
    pub fn try_wait(&mut self) -> Option<Result<&T, PoolError>> {
        if self.outcome.is_none() {
            let rx = self.receiver.as_mut()?;
            let outcome = match rx.try_recv() {
                Ok(res) => res,
                Err(oneshot::error::TryRecvError::Empty) => return None,
                Err(oneshot::error::TryRecvError::Closed) => Err(PoolError::ResultLost),
            };
            self.receiver = None;
            self.outcome = Some(Box::new(outcome));
        }
        Some(self.cached())
    }

    #[inline]
    pub fn is_finished(&mut self) -> bool {
        self.try_wait().is_some()
    }

    /// Блокирующее ожидание, забирает значение
    pub fn join(mut self) -> TaskResult<T> {
        if let Some(outcome) = self.outcome.take() {
            return *outcome;
        }
        match self.receiver.take() {
            Some(rx) => futures::executor::block_on(rx).unwrap_or(Err(PoolError::ResultLost)),
            None => Err(PoolError::ResultLost),
        }
    }

    /// Асинхронное ожидание с таймаутом; сама задача продолжает выполняться
    pub async fn await_timeout(self, timeout: Duration) -> TaskResult<T> {
        match tokio::time::timeout(timeout, self).await {
            Ok(result) => result,
            Err(_) => Err(PoolError::Timeout),
        }
    }

    fn cached(&self) -> Result<&T, PoolError> {
        match self.outcome.as_deref() {
            Some(Ok(value)) => Ok(value),
            Some(Err(e)) => Err(e.clone()),
            None => Err(PoolError::ResultLost),
        }
    }
}

impl<T> Future for ResultHandle<T> {
    type Output = TaskResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(outcome) = this.outcome.take() {
            return Poll::Ready(*outcome);
        }
        let Some(rx) = this.receiver.as_mut() else {
            return Poll::Ready(Err(PoolError::ResultLost));
        };
        match Pin::new(rx).poll(cx) {
            Poll::Ready(res) => {
                this.receiver = None;
                Poll::Ready(res.unwrap_or(Err(PoolError::ResultLost)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
