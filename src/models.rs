//! Модели данных синхронизации текста и аудио

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::config::TimingPrecision;

/// Сегмент текста главы (обычно одно предложение)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    /// Идентификатор сегмента; если не задан, присваивается `seg_{n}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Текст сегмента
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_char: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_char: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_index: Option<usize>,
}

impl TextSegment {
    /// Создать новый сегмент
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: text.into(),
            start_char: None,
            end_char: None,
            sentence_index: None,
        }
    }

    /// Сегмент без идентификатора
    pub fn anonymous(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            start_char: None,
            end_char: None,
            sentence_index: None,
        }
    }

    /// Количество слов, разделённых пробельными символами
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Временная метка одного сегмента
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestamp {
    pub segment_id: String,
    /// Начало, секунды
    pub start_time: f64,
    /// Конец, секунды
    pub end_time: f64,
    /// Уверенность в диапазоне [0.1, 1.0]
    pub confidence: f64,
    pub text: String,
    pub word_count: usize,
}

impl Timestamp {
    /// Длительность метки
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Качество разметки главы
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SyncQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    /// Разметка не найдена
    NotAvailable,
}

impl SyncQuality {
    /// Получить строковое представление качества
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::NotAvailable => "not_available",
        }
    }
}

impl std::fmt::Display for SyncQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Разметка главы: упорядоченные временные метки и их сводная оценка
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMapping {
    pub book_id: String,
    pub chapter_id: String,
    pub timestamps: Vec<Timestamp>,
    pub total_duration: f64,
    pub sync_quality: SyncQuality,
    pub precision_level: TimingPrecision,
    pub created_at: DateTime<Local>,
}

impl SyncMapping {
    /// Пустая разметка для главы, которой нет в хранилище
    pub fn not_available(book_id: &str, chapter_id: &str) -> Self {
        Self {
            book_id: book_id.to_string(),
            chapter_id: chapter_id.to_string(),
            timestamps: Vec::new(),
            total_duration: 0.0,
            sync_quality: SyncQuality::NotAvailable,
            precision_level: TimingPrecision::default(),
            created_at: Local::now(),
        }
    }

    /// Есть ли в разметке хотя бы одна метка
    pub fn is_available(&self) -> bool {
        !self.timestamps.is_empty()
    }
}

/// Статистика хранилища разметок
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_mappings: usize,
    pub distinct_books: usize,
    /// Приблизительный размер: длина JSON-представления всех разметок, байты
    pub approx_size_bytes: usize,
    pub cache_size_mb: f64,
}
