//! Построение и нормализация временной шкалы

use crate::error::{Result, SyncError};
use crate::models::{TextSegment, Timestamp};

/// Округлить до миллисекунд
pub(crate) fn round_millis(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Последовательно разложить скорректированные длительности по шкале
///
/// Шкала не выходит за `audio_duration`; если длительность исчерпана раньше,
/// оставшиеся сегменты меток не получают. Уверенность проставляется отдельно.
pub fn build_timeline(
    segments: &[TextSegment],
    durations: &[f64],
    audio_duration: f64,
) -> Result<Vec<Timestamp>> {
    let mut timestamps = Vec::with_capacity(segments.len());
    let mut current_time = 0.0_f64;

    for (segment, duration) in segments.iter().zip(durations) {
        if !duration.is_finite() {
            return Err(SyncError::Computation(format!(
                "non-finite duration {} for segment #{}",
                duration,
                timestamps.len()
            )));
        }

        let end_time = (current_time + duration).min(audio_duration);
        let segment_id = segment
            .id
            .clone()
            .unwrap_or_else(|| format!("seg_{}", timestamps.len()));

        timestamps.push(Timestamp {
            segment_id,
            start_time: round_millis(current_time),
            end_time: round_millis(end_time),
            confidence: 0.0,
            text: segment.text.clone(),
            word_count: segment.word_count(),
        });
        current_time = end_time;

        if current_time >= audio_duration {
            break;
        }
    }

    Ok(timestamps)
}

/// Растянуть шкалу до точной длительности и устранить разрывы
///
/// После масштабирования начало каждой метки заменяется концом предыдущей,
/// поэтому длительности отдельных меток могут немного отличаться от
/// масштабированных.
pub fn normalize(timestamps: &mut [Timestamp], total_duration: f64) -> Result<()> {
    let current_total = match timestamps.last() {
        Some(last) => last.end_time,
        None => return Ok(()),
    };
    if current_total == 0.0 {
        return Ok(());
    }

    let scale = total_duration / current_total;
    if !scale.is_finite() {
        return Err(SyncError::Computation(format!(
            "cannot scale timeline ending at {} to {} seconds",
            current_total, total_duration
        )));
    }

    for timestamp in timestamps.iter_mut() {
        timestamp.start_time = round_millis(timestamp.start_time * scale);
        timestamp.end_time = round_millis(timestamp.end_time * scale);
    }

    for i in 1..timestamps.len() {
        timestamps[i].start_time = timestamps[i - 1].end_time;
    }

    Ok(())
}
