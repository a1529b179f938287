//! Модуль эвристического расчета временных меток
//!
//! Конвейер: оценка длительностей → поправки темпа → временная шкала →
//! уверенность → нормализация. Качество разметки оценивается в `quality`.

pub mod confidence;
pub mod estimator;
pub mod pacing;
pub mod quality;
pub mod timeline;

use crate::config::SyncConfig;
use crate::error::Result;
use crate::models::{TextSegment, Timestamp};
use crate::progress::{ProcessStep, ProgressTracker};

/// Рассчитать нормализованные временные метки для сегментов главы
///
/// Вырожденный вход (нет сегментов, нет слов, неположительная длительность)
/// дает пустой список без ошибки.
pub fn compute_timestamps(
    segments: &[TextSegment],
    audio_duration: f64,
    config: &SyncConfig,
    tracker: Option<&ProgressTracker>,
) -> Result<Vec<Timestamp>> {
    if let Some(t) = tracker {
        t.set_step(ProcessStep::DurationEstimation);
        t.update_step_progress(0.0, Some(format!("{} segments", segments.len())));
    }

    let Some(rate) = estimator::estimate_rate(segments, audio_duration) else {
        log::warn!(
            "Degenerate sync input: {} segments, audio duration {}",
            segments.len(),
            audio_duration
        );
        return Ok(Vec::new());
    };
    log::debug!(
        "{} words over {:.3}s, {:.3} words/s",
        rate.total_words,
        audio_duration,
        rate.words_per_second
    );
    let raw = estimator::raw_durations(segments, &rate);

    if let Some(t) = tracker {
        t.set_step(ProcessStep::PacingAdjustment);
    }
    let adjusted: Vec<f64> = segments
        .iter()
        .zip(&raw)
        .map(|(segment, base)| pacing::adjust_duration(&segment.text, *base, &config.pacing))
        .collect();

    if let Some(t) = tracker {
        t.set_step(ProcessStep::TimelineBuilding);
    }
    let mut timestamps = timeline::build_timeline(segments, &adjusted, audio_duration)?;
    if timestamps.len() < segments.len() {
        log::debug!(
            "Audio duration exhausted after {} of {} segments",
            timestamps.len(),
            segments.len()
        );
    }

    if let Some(t) = tracker {
        t.set_step(ProcessStep::ConfidenceScoring);
    }
    confidence::score_timestamps(&mut timestamps, &adjusted, &config.confidence);

    if let Some(t) = tracker {
        t.set_step(ProcessStep::Normalization);
    }
    timeline::normalize(&mut timestamps, audio_duration)?;

    Ok(timestamps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_covers_duration() {
        let segments = vec![
            TextSegment::new("1", "It was a bright cold day in April."),
            TextSegment::new("2", "The clocks were striking thirteen."),
            TextSegment::new("3", "\"Who's there?\" she asked, quietly."),
        ];
        let timestamps = compute_timestamps(&segments, 12.5, &SyncConfig::default(), None).unwrap();

        assert_eq!(timestamps.len(), 3);
        assert_eq!(timestamps[0].start_time, 0.0);
        assert!((timestamps[2].end_time - 12.5).abs() < 1e-3);
        for pair in timestamps.windows(2) {
            assert_eq!(pair[1].start_time, pair[0].end_time);
        }
    }

    #[test]
    fn test_pipeline_degenerate() {
        let config = SyncConfig::default();
        assert!(compute_timestamps(&[], 10.0, &config, None).unwrap().is_empty());
        assert!(compute_timestamps(&[TextSegment::new("a", " ")], 10.0, &config, None)
            .unwrap()
            .is_empty());
        assert!(compute_timestamps(&[TextSegment::new("a", "word")], 0.0, &config, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_pipeline_reports_every_step() {
        use crate::notification::MemoryProgressObserver;
        use crate::progress::{DefaultProgressReporter, ProgressReporter};

        let observer = MemoryProgressObserver::new();
        let reporter = DefaultProgressReporter::new();
        reporter.add_observer(Box::new(observer.clone()));
        let tracker = ProgressTracker::with_reporter(std::sync::Arc::new(reporter));

        let segments = vec![TextSegment::new("a", "Hello there.")];
        compute_timestamps(&segments, 2.0, &SyncConfig::default(), Some(&tracker)).unwrap();

        let steps: Vec<String> = observer.history().into_iter().map(|p| p.step).collect();
        for step in [
            ProcessStep::PacingAdjustment,
            ProcessStep::TimelineBuilding,
            ProcessStep::ConfidenceScoring,
            ProcessStep::Normalization,
        ] {
            assert!(steps.iter().any(|s| s == step.as_str()), "missing {:?}", step);
        }
    }
}
