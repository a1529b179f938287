//! Поправки темпа речи по особенностям текста
//!
//! Поправки применяются строго в таком порядке: паузы на концах предложений,
//! паузы внутри предложений, прямая речь, длинные предложения, сложные
//! слова, нижняя граница.

use crate::config::PacingConfig;

/// Скорректировать исходную длительность сегмента
pub fn adjust_duration(text: &str, base_duration: f64, config: &PacingConfig) -> f64 {
    let mut duration = base_duration;

    let sentence_marks = count_chars(text, &['.', '!', '?']);
    let clause_marks = count_chars(text, &[',', ';', ':']);
    duration += sentence_marks as f64 * config.sentence_pause;
    duration += clause_marks as f64 * config.clause_pause;

    // Прямая речь читается быстрее
    if text.contains('"') || text.contains('\'') {
        duration *= config.dialogue_multiplier;
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > config.long_sentence_words {
        duration *= config.long_sentence_multiplier;
    }

    let complex_words = words
        .iter()
        .filter(|word| word.chars().count() > config.complex_word_chars)
        .count();
    if complex_words > 0 {
        duration *= 1.0 + complex_words as f64 * config.complex_word_factor;
    }

    duration.max(config.min_duration)
}

fn count_chars(text: &str, marks: &[char]) -> usize {
    text.chars().filter(|c| marks.contains(c)).count()
}
