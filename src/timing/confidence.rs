//! Оценка уверенности для отдельных временных меток

use crate::config::ConfidenceConfig;
use crate::models::Timestamp;

/// Уверенность в метке сегмента с длительностью `duration` после поправок темпа
pub fn score_segment(text: &str, word_count: usize, duration: f64, config: &ConfidenceConfig) -> f64 {
    let mut confidence = config.base;

    if word_count > config.long_segment_words {
        confidence += config.long_segment_bonus;
    }
    if word_count < config.short_segment_words {
        confidence -= config.short_segment_penalty;
    }

    if text.trim().ends_with(['.', '!', '?']) {
        confidence += config.sentence_end_bonus;
    }
    if text.contains("...") || text.contains("--") {
        confidence -= config.unusual_punctuation_penalty;
    }

    let (min_reasonable, max_reasonable) = config.reasonable_duration;
    if (min_reasonable..=max_reasonable).contains(&duration) {
        confidence += config.reasonable_duration_bonus;
    } else if duration > config.excessive_duration {
        confidence -= config.excessive_duration_penalty;
    }

    confidence.clamp(config.min, config.max)
}

/// Проставить уверенность меткам; `durations[i]` относится к `timestamps[i]`
pub fn score_timestamps(timestamps: &mut [Timestamp], durations: &[f64], config: &ConfidenceConfig) {
    for (timestamp, duration) in timestamps.iter_mut().zip(durations) {
        timestamp.confidence =
            score_segment(&timestamp.text, timestamp.word_count, *duration, config);
    }
}
