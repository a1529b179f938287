//! Оценка исходной длительности сегментов по количеству слов

use crate::models::TextSegment;

/// Базовый темп речи для главы
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeakingRate {
    /// Суммарное количество слов во всех сегментах
    pub total_words: usize,
    /// Слов в секунду
    pub words_per_second: f64,
}

impl SpeakingRate {
    /// Исходная длительность сегмента с заданным числом слов
    pub fn raw_duration(&self, word_count: usize) -> f64 {
        word_count as f64 / self.words_per_second
    }
}

/// Рассчитать темп речи для главы
///
/// Возвращает `None` для вырожденного входа: нет сегментов, нет слов или
/// длительность аудио не положительна.
pub fn estimate_rate(segments: &[TextSegment], audio_duration: f64) -> Option<SpeakingRate> {
    if segments.is_empty() || !audio_duration.is_finite() || audio_duration <= 0.0 {
        return None;
    }

    let total_words: usize = segments.iter().map(TextSegment::word_count).sum();
    if total_words == 0 {
        return None;
    }

    Some(SpeakingRate {
        total_words,
        words_per_second: total_words as f64 / audio_duration,
    })
}

/// Исходные длительности всех сегментов
pub fn raw_durations(segments: &[TextSegment], rate: &SpeakingRate) -> Vec<f64> {
    segments
        .iter()
        .map(|segment| rate.raw_duration(segment.word_count()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_from_total_words() {
        let segments = vec![
            TextSegment::new("a", "one two three"),
            TextSegment::new("b", "four five six seven"),
        ];
        let rate = estimate_rate(&segments, 3.5).unwrap();
        assert_eq!(rate.total_words, 7);
        assert!((rate.words_per_second - 2.0).abs() < 1e-12);

        let durations = raw_durations(&segments, &rate);
        assert!((durations[0] - 1.5).abs() < 1e-12);
        assert!((durations[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(estimate_rate(&[], 10.0).is_none());
        assert!(estimate_rate(&[TextSegment::new("a", "   ")], 10.0).is_none());
        assert!(estimate_rate(&[TextSegment::new("a", "word")], 0.0).is_none());
        assert!(estimate_rate(&[TextSegment::new("a", "word")], -1.0).is_none());
        assert!(estimate_rate(&[TextSegment::new("a", "word")], f64::NAN).is_none());
    }
}
