//! Основной файл библиотеки text-audio-sync
//!
//! Библиотека оценивает по одному только тексту, где в уже озвученной главе
//! звучит каждый сегмент, и строит временные метки для подсветки текста
//! синхронно с воспроизведением. Аудиосигнал не анализируется: единственная
//! опорная величина — общая длительность аудио.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod notification;
pub mod progress;
pub mod store;
pub mod timing;
pub mod utils;

use std::sync::Arc;

pub use crate::config::{SyncConfig, TimingPrecision};
pub use crate::error::{Result, SyncError};
pub use crate::models::{CacheStats, SyncMapping, SyncQuality, TextSegment, Timestamp};
pub use crate::store::SyncStore;

use crate::progress::{
    DefaultProgressReporter, ProcessStep, ProgressObserver, ProgressReporter, ProgressTracker,
};

/// Уверенность метки после ручной правки не выше этого значения
pub const MANUAL_EDIT_CONFIDENCE_CAP: f64 = 0.9;

/// Движок синхронизации текста и аудио
///
/// Движок можно разделять между потоками через `Arc`. Репортер прогресса
/// общий, но каждый вызов `create_sync_mapping` ведет собственный
/// `ProgressTracker` с меткой `book/chapter`, так что этапы параллельных
/// вызовов не смешиваются.
pub struct SyncEngine {
    /// Конфигурация эвристик
    config: SyncConfig,
    /// Хранилище рассчитанных разметок
    store: Arc<SyncStore>,
    /// Репортер прогресса
    reporter: Option<Arc<dyn ProgressReporter>>,
}

impl SyncEngine {
    /// Создать движок с указанной конфигурацией и хранилищем
    pub fn new(config: SyncConfig, store: Arc<SyncStore>) -> Self {
        Self {
            config,
            store,
            reporter: None,
        }
    }

    /// Создать движок с репортером прогресса
    pub fn with_progress_reporter(
        config: SyncConfig,
        store: Arc<SyncStore>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            config,
            store,
            reporter: Some(reporter),
        }
    }

    /// Установить репортер прогресса
    pub fn set_progress_reporter(&mut self, reporter: Arc<dyn ProgressReporter>) {
        self.reporter = Some(reporter);
    }

    /// Добавить наблюдателя прогресса
    ///
    /// Если репортер еще не задан, создается `DefaultProgressReporter`.
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize {
        let reporter = self.reporter.get_or_insert_with(|| {
            let reporter: Arc<dyn ProgressReporter> = Arc::new(DefaultProgressReporter::new());
            reporter
        });
        reporter.add_observer(observer)
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SyncStore> {
        &self.store
    }

    /// Рассчитать разметку главы и сохранить ее в хранилище
    ///
    /// Предыдущая разметка той же главы заменяется. При одновременных
    /// вызовах для одной главы сохраняется результат последнего завершившегося.
    pub fn create_sync_mapping(
        &self,
        book_id: &str,
        chapter_id: &str,
        audio_duration: f64,
        segments: &[TextSegment],
        precision: TimingPrecision,
    ) -> Result<Arc<SyncMapping>> {
        log::debug!(
            "Creating sync mapping for {}/{} ({} segments, {:.3}s, precision {})",
            book_id,
            chapter_id,
            segments.len(),
            audio_duration,
            precision.as_str()
        );

        let tracker = self.reporter.as_ref().map(|reporter| {
            ProgressTracker::with_reporter(Arc::clone(reporter))
                .with_label(format!("{}/{}", book_id, chapter_id))
        });
        let tracker = tracker.as_ref();

        let timestamps = timing::compute_timestamps(segments, audio_duration, &self.config, tracker)
            .map_err(|e| {
                log::error!("Sync mapping creation failed for {}/{}: {}", book_id, chapter_id, e);
                e
            })?;

        if let Some(t) = tracker {
            t.set_step(ProcessStep::QualityAssessment);
        }
        let sync_quality = timing::quality::assess_quality(&timestamps, &self.config.quality);

        let mapping = SyncMapping {
            book_id: book_id.to_string(),
            chapter_id: chapter_id.to_string(),
            timestamps,
            total_duration: audio_duration,
            sync_quality,
            precision_level: precision,
            created_at: chrono::Local::now(),
        };
        let count = mapping.timestamps.len();
        let mapping = self.store.insert(mapping);

        if let Some(t) = tracker {
            t.complete();
        }

        log::info!(
            "Created sync mapping for {}/{} with {} timestamps ({})",
            book_id,
            chapter_id,
            count,
            sync_quality
        );
        Ok(mapping)
    }

    /// Получить сохраненную разметку или пустую разметку `not_available`
    pub fn get_sync_data(&self, book_id: &str, chapter_id: &str) -> Arc<SyncMapping> {
        self.store
            .get(book_id, chapter_id)
            .unwrap_or_else(|| Arc::new(SyncMapping::not_available(book_id, chapter_id)))
    }

    /// Ручная правка метки сегмента
    ///
    /// Время записывается как есть, без согласования с соседними метками;
    /// уверенность ограничивается `MANUAL_EDIT_CONFIDENCE_CAP`. Качество
    /// разметки не пересчитывается (см. `reassess_quality`). Возвращает
    /// `false`, если нет разметки или сегмента.
    pub fn update_sync_timing(
        &self,
        book_id: &str,
        chapter_id: &str,
        segment_id: &str,
        start_time: f64,
        end_time: f64,
    ) -> bool {
        let updated = self.store.modify(book_id, chapter_id, |current| {
            let index = current
                .timestamps
                .iter()
                .position(|t| t.segment_id == segment_id)?;

            let mut next = current.clone();
            let timestamp = &mut next.timestamps[index];
            timestamp.start_time = start_time;
            timestamp.end_time = end_time;
            timestamp.confidence = timestamp.confidence.min(MANUAL_EDIT_CONFIDENCE_CAP);
            Some(next)
        });

        if updated {
            log::info!(
                "Updated timing for segment {} in {}/{}",
                segment_id,
                book_id,
                chapter_id
            );
        } else {
            log::debug!(
                "No timing update for segment {} in {}/{}",
                segment_id,
                book_id,
                chapter_id
            );
        }
        updated
    }

    /// Пересчитать качество сохраненной разметки после ручных правок
    pub fn reassess_quality(&self, book_id: &str, chapter_id: &str) -> Option<SyncQuality> {
        let mut quality = None;
        self.store.modify(book_id, chapter_id, |current| {
            let reassessed =
                timing::quality::assess_quality(&current.timestamps, &self.config.quality);
            quality = Some(reassessed);
            if reassessed == current.sync_quality {
                return None;
            }
            let mut next = current.clone();
            next.sync_quality = reassessed;
            Some(next)
        });
        quality
    }

    /// Очистить хранилище для книги или целиком; возвращает число удаленных разметок
    pub fn clear_cache(&self, book_id: Option<&str>) -> usize {
        let removed = match book_id {
            Some(book_id) => self.store.remove_book(book_id),
            None => self.store.clear(),
        };
        log::info!(
            "Cleared sync cache for book: {} ({} mappings)",
            book_id.unwrap_or("all"),
            removed
        );
        removed
    }

    /// Статистика хранилища
    pub fn get_cache_stats(&self) -> CacheStats {
        self.store.stats()
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(SyncConfig::default(), Arc::new(SyncStore::new()))
    }
}

/// Рассчитать временные метки без сохранения, с настройками по умолчанию
pub fn estimate_timestamps(segments: &[TextSegment], audio_duration: f64) -> Result<Vec<Timestamp>> {
    timing::compute_timestamps(segments, audio_duration, &SyncConfig::default(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SyncEngine {
        SyncEngine::default()
    }

    #[test]
    fn test_update_unknown_segment_returns_false() {
        let engine = engine();
        engine
            .create_sync_mapping(
                "b",
                "c",
                4.0,
                &[TextSegment::new("s1", "Hello there friend.")],
                TimingPrecision::Sentence,
            )
            .unwrap();

        assert!(!engine.update_sync_timing("b", "c", "nope", 0.0, 1.0));
        assert!(!engine.update_sync_timing("b", "missing", "s1", 0.0, 1.0));
    }

    #[test]
    fn test_update_first_match_only() {
        let engine = engine();
        let segments = vec![
            TextSegment::new("dup", "First sentence here."),
            TextSegment::new("dup", "Second sentence here."),
        ];
        engine
            .create_sync_mapping("b", "c", 6.0, &segments, TimingPrecision::Sentence)
            .unwrap();
        let before = engine.get_sync_data("b", "c");

        assert!(engine.update_sync_timing("b", "c", "dup", 0.5, 1.5));

        let after = engine.get_sync_data("b", "c");
        assert_eq!(after.timestamps[0].start_time, 0.5);
        assert_eq!(after.timestamps[1], before.timestamps[1]);
    }

    #[test]
    fn test_reassess_quality_after_manual_edit() {
        let engine = engine();
        let segments = vec![
            TextSegment::new("s1", "One two three four five six seven eight nine ten eleven."),
            TextSegment::new("s2", "Another sentence with plenty of words to read aloud here."),
        ];
        let mapping = engine
            .create_sync_mapping("b", "c", 8.0, &segments, TimingPrecision::Sentence)
            .unwrap();
        assert_eq!(mapping.sync_quality, SyncQuality::Excellent);

        // Растягиваем вторую метку так, что средняя длительность выходит за 8 секунд
        assert!(engine.update_sync_timing("b", "c", "s2", 4.0, 16.0));
        assert_eq!(engine.get_sync_data("b", "c").sync_quality, SyncQuality::Excellent);

        assert_eq!(engine.reassess_quality("b", "c"), Some(SyncQuality::Good));
        assert_eq!(engine.get_sync_data("b", "c").sync_quality, SyncQuality::Good);
        assert_eq!(engine.reassess_quality("x", "y"), None);
    }

    #[test]
    fn test_add_observer_creates_reporter() {
        let mut engine = engine();
        let observer = notification::MemoryProgressObserver::new();
        engine.add_observer(Box::new(observer.clone()));

        engine
            .create_sync_mapping(
                "b",
                "c",
                3.0,
                &[TextSegment::new("s1", "Hello world.")],
                TimingPrecision::Word,
            )
            .unwrap();

        let history = observer.history();
        assert!(!history.is_empty());
        assert_eq!(history.last().unwrap().total_progress, 100.0);
    }

    #[test]
    fn test_estimate_timestamps_does_not_store() {
        let timestamps = estimate_timestamps(&[TextSegment::new("a", "Hi there.")], 2.0).unwrap();
        assert_eq!(timestamps.len(), 1);
        assert_eq!(timestamps[0].end_time, 2.0);
    }
}
