//! Модуль обработки ошибок библиотеки text-audio-sync
//!
//! Вырожденные входные данные (пустой список сегментов, ноль слов,
//! неположительная длительность) ошибкой не считаются: движок возвращает
//! пустую разметку. Ошибки ниже относятся к сбоям вычисления и к границе API.

use thiserror::Error;

/// Ошибки библиотеки text-audio-sync
#[derive(Debug, Error)]
pub enum SyncError {
    /// Непредвиденный сбой при оценке длительностей или построении шкалы
    #[error("Sync computation error: {0}")]
    Computation(String),

    /// Некорректный запрос на границе API
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Разметка для главы отсутствует
    #[error("Sync mapping not found: {0}")]
    NotFound(String),

    /// Ошибка конфигурации
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Другая ошибка
    #[error("Other error: {0}")]
    Other(String),
}

impl From<&str> for SyncError {
    fn from(s: &str) -> Self {
        SyncError::Other(s.to_string())
    }
}

impl From<String> for SyncError {
    fn from(s: String) -> Self {
        SyncError::Other(s)
    }
}

/// Тип Result для библиотеки text-audio-sync
pub type Result<T> = std::result::Result<T, SyncError>;
