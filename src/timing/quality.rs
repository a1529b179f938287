//! Сводная оценка качества разметки главы

use crate::config::QualityThresholds;
use crate::models::{SyncQuality, Timestamp};

/// Метрики временных меток разметки
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingMetrics {
    /// Средняя уверенность
    pub avg_confidence: f64,
    /// Средняя длительность метки
    pub avg_duration: f64,
}

/// Анализ временных меток; `None` для пустой разметки
pub fn analyze_timestamps(timestamps: &[Timestamp]) -> Option<TimingMetrics> {
    if timestamps.is_empty() {
        return None;
    }

    let mut total_confidence = 0.0;
    let mut total_duration = 0.0;
    for timestamp in timestamps {
        total_confidence += timestamp.confidence;
        total_duration += timestamp.duration();
    }

    let count = timestamps.len() as f64;
    Some(TimingMetrics {
        avg_confidence: total_confidence / count,
        avg_duration: total_duration / count,
    })
}

/// Классифицировать качество разметки (первое совпадение)
pub fn assess_quality(timestamps: &[Timestamp], thresholds: &QualityThresholds) -> SyncQuality {
    let Some(metrics) = analyze_timestamps(timestamps) else {
        return SyncQuality::Poor;
    };

    let within = |(lo, hi): (f64, f64)| (lo..=hi).contains(&metrics.avg_duration);

    if metrics.avg_confidence > thresholds.excellent_confidence
        && within(thresholds.excellent_duration)
    {
        SyncQuality::Excellent
    } else if metrics.avg_confidence > thresholds.good_confidence && within(thresholds.good_duration)
    {
        SyncQuality::Good
    } else if metrics.avg_confidence > thresholds.fair_confidence {
        SyncQuality::Fair
    } else {
        SyncQuality::Poor
    }
}
