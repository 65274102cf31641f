use super::errors::PoolError;

/// Итог выполнения задачи: значение или ошибка, доставленная через `ResultHandle`
pub type TaskResult<T> = Result<T, PoolError>;
