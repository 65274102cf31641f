use thiserror::Error;

/// Ошибки пула и выполняемых в нём задач
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Пул уже начал остановку, новые задачи не принимаются
    #[error("pool is shutting down")]
    ShuttingDown,

    #[error("invalid pool configuration: {0}")]
    InvalidConfiguration(String),

    /// Тело задачи запаниковало; сообщение извлечено из payload паники
    #[error("task panicked: {0}")]
    TaskPanicked(String),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),

    /// Сторона записи результата уничтожена без значения
    #[error("task result was lost before completion")]
    ResultLost,

    #[error("timed out waiting for task result")]
    Timeout,
}

pub type PoolResult<T> = Result<T, PoolError>;

/// Достаёт текст из payload паники (`&str` или `String`)
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
