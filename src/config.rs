//! Модуль конфигурации библиотеки text-audio-sync
//!
//! Все эвристические константы движка собраны здесь. Значения по умолчанию
//! воспроизводят эталонное поведение; порядок применения поправок задан
//! кодом в `timing::pacing` и от конфигурации не зависит.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Запрошенная гранулярность разметки
///
/// Пока только сохраняется в метаданных разметки и на вычисление не влияет.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimingPrecision {
    /// По словам
    Word,
    /// По предложениям
    #[default]
    Sentence,
    /// По абзацам
    Paragraph,
}

impl TimingPrecision {
    /// Получить строковое представление точности
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Sentence => "sentence",
            Self::Paragraph => "paragraph",
        }
    }
}

impl std::str::FromStr for TimingPrecision {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "word" => Ok(Self::Word),
            "sentence" => Ok(Self::Sentence),
            "paragraph" => Ok(Self::Paragraph),
            other => Err(SyncError::InvalidInput(format!(
                "timing_precision must be one of word|sentence|paragraph, got '{}'",
                other
            ))),
        }
    }
}

/// Поправки темпа речи
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PacingConfig {
    /// Пауза на каждый знак конца предложения (`.`, `!`, `?`), секунды
    pub sentence_pause: f64,
    /// Пауза на каждый знак внутри предложения (`,`, `;`, `:`), секунды
    pub clause_pause: f64,
    /// Множитель для сегментов с прямой речью (кавычки)
    pub dialogue_multiplier: f64,
    /// Сегмент длиннее этого числа слов читается медленнее
    pub long_sentence_words: usize,
    /// Множитель для длинных сегментов
    pub long_sentence_multiplier: f64,
    /// Слово длиннее этого числа символов считается сложным
    pub complex_word_chars: usize,
    /// Замедление на каждое сложное слово
    pub complex_word_factor: f64,
    /// Минимальная длительность сегмента, секунды
    pub min_duration: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            sentence_pause: 0.5,
            clause_pause: 0.3,
            dialogue_multiplier: 0.9,
            long_sentence_words: 20,
            long_sentence_multiplier: 1.1,
            complex_word_chars: 8,
            complex_word_factor: 0.05,
            min_duration: 0.1,
        }
    }
}

/// Параметры оценки уверенности для отдельной метки
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub base: f64,
    pub long_segment_words: usize,
    pub long_segment_bonus: f64,
    pub short_segment_words: usize,
    pub short_segment_penalty: f64,
    pub sentence_end_bonus: f64,
    pub unusual_punctuation_penalty: f64,
    /// Диапазон "разумной" длительности, секунды
    pub reasonable_duration: (f64, f64),
    pub reasonable_duration_bonus: f64,
    pub excessive_duration: f64,
    pub excessive_duration_penalty: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            base: 0.8,
            long_segment_words: 10,
            long_segment_bonus: 0.1,
            short_segment_words: 3,
            short_segment_penalty: 0.2,
            sentence_end_bonus: 0.1,
            unusual_punctuation_penalty: 0.1,
            reasonable_duration: (1.0, 10.0),
            reasonable_duration_bonus: 0.1,
            excessive_duration: 15.0,
            excessive_duration_penalty: 0.2,
            min: 0.1,
            max: 1.0,
        }
    }
}

/// Пороги классификации качества разметки
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QualityThresholds {
    pub excellent_confidence: f64,
    pub excellent_duration: (f64, f64),
    pub good_confidence: f64,
    pub good_duration: (f64, f64),
    pub fair_confidence: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            excellent_confidence: 0.85,
            excellent_duration: (0.5, 8.0),
            good_confidence: 0.7,
            good_duration: (0.3, 12.0),
            fair_confidence: 0.5,
        }
    }
}

/// Конфигурация библиотеки
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Поправки темпа
    pub pacing: PacingConfig,
    /// Оценка уверенности
    pub confidence: ConfidenceConfig,
    /// Пороги качества
    pub quality: QualityThresholds,
    /// Точность, если запрос её не указал
    pub default_precision: TimingPrecision,
}

impl SyncConfig {
    /// Разобрать конфигурацию из JSON; отсутствующие поля берутся по умолчанию
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SyncConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Загрузить конфигурацию из JSON файла
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Configuration(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        log::debug!("Loaded sync config from {}", path.display());
        Self::from_json_str(&data)
    }

    /// Проверить, что константы пригодны для вычислений
    pub fn validate(&self) -> Result<()> {
        let p = &self.pacing;
        for (name, value) in [
            ("pacing.sentence_pause", p.sentence_pause),
            ("pacing.clause_pause", p.clause_pause),
            ("pacing.complex_word_factor", p.complex_word_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SyncError::Configuration(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("pacing.dialogue_multiplier", p.dialogue_multiplier),
            ("pacing.long_sentence_multiplier", p.long_sentence_multiplier),
            ("pacing.min_duration", p.min_duration),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SyncError::Configuration(format!(
                    "{} must be a finite positive number, got {}",
                    name, value
                )));
            }
        }

        let c = &self.confidence;
        if !(c.min.is_finite() && c.max.is_finite()) || c.min > c.max {
            return Err(SyncError::Configuration(format!(
                "confidence bounds are invalid: [{}, {}]",
                c.min, c.max
            )));
        }

        Ok(())
    }
}
