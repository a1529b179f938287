//! Наблюдатели прогресса
//!
//! `LogProgressObserver` пишет в лог, `MemoryProgressObserver` копит историю,
//! `ChannelProgressObserver` передает обновления в асинхронный код через
//! канал tokio, `CompositeProgressObserver` раздает одно обновление нескольким.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::progress::{ProgressInfo, ProgressObserver};

/// Наблюдатель, пишущий прогресс в лог на уровне debug
#[derive(Default)]
pub struct LogProgressObserver {
    prefix: String,
}

impl LogProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Наблюдатель с префиксом перед каждой строкой
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl ProgressObserver for LogProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        log::debug!(
            "{}{} {:.0}% (total {:.1}%){}",
            self.prefix,
            progress.step,
            progress.step_progress,
            progress.total_progress,
            progress
                .details
                .as_deref()
                .map(|details| format!(" [{}]", details))
                .unwrap_or_default()
        );
    }
}

/// Наблюдатель, сохраняющий историю обновлений в памяти
///
/// Клоны разделяют одну историю: клон подключается к репортеру, а оригинал
/// остается у вызывающего для чтения.
#[derive(Clone, Default)]
pub struct MemoryProgressObserver {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl MemoryProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Копия истории обновлений
    pub fn history(&self) -> Vec<ProgressInfo> {
        self.history.lock().clone()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }
}

impl ProgressObserver for MemoryProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        self.history.lock().push(progress);
    }
}

/// Наблюдатель, передающий обновления в канал tokio
///
/// Вычисление разметки синхронное, поэтому отправка не ждет получателя:
/// если канал заполнен или закрыт, обновление отбрасывается и учитывается
/// в `dropped`.
pub struct ChannelProgressObserver {
    sender: mpsc::Sender<ProgressInfo>,
    dropped: Arc<AtomicUsize>,
}

impl ChannelProgressObserver {
    pub fn new(sender: mpsc::Sender<ProgressInfo>) -> Self {
        Self {
            sender,
            dropped: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Создать канал заданной емкости и наблюдателя для него
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressInfo>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Счетчик отброшенных обновлений; остается доступен после передачи
    /// наблюдателя репортеру
    pub fn dropped_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.dropped)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl ProgressObserver for ChannelProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        if let Err(e) = self.sender.try_send(progress) {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            log::warn!("Dropping progress update ({} so far): {}", dropped, e);
        }
    }
}

/// Наблюдатель, раздающий каждое обновление нескольким наблюдателям
#[derive(Default)]
pub struct CompositeProgressObserver {
    observers: Vec<Box<dyn ProgressObserver>>,
}

impl CompositeProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl ProgressObserver for CompositeProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        for observer in &self.observers {
            observer.on_progress_update(progress.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProcessStep;

    fn update(step: ProcessStep, total: f32) -> ProgressInfo {
        ProgressInfo::new(step.as_str(), 0.0, total, None)
    }

    #[test]
    fn test_log_observer_accepts_details() {
        let observer = LogProgressObserver::with_prefix("[sync] ");
        observer.on_progress_update(ProgressInfo::new(
            ProcessStep::Normalization.as_str(),
            50.0,
            72.5,
            Some("book/ch1".to_string()),
        ));
    }

    #[test]
    fn test_memory_observer_clones_share_history() {
        let observer = MemoryProgressObserver::new();
        let attached = observer.clone();

        attached.on_progress_update(update(ProcessStep::DurationEstimation, 0.0));
        attached.on_progress_update(update(ProcessStep::PacingAdjustment, 15.0));

        let history = observer.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].step, ProcessStep::PacingAdjustment.as_str());

        observer.clear_history();
        assert!(attached.history().is_empty());
    }

    #[tokio::test]
    async fn test_channel_observer_delivers_in_order() {
        let (observer, mut rx) = ChannelProgressObserver::channel(8);

        observer.on_progress_update(update(ProcessStep::TimelineBuilding, 40.0));
        observer.on_progress_update(update(ProcessStep::ConfidenceScoring, 65.0));
        drop(observer);

        assert_eq!(rx.recv().await.unwrap().total_progress, 40.0);
        assert_eq!(rx.recv().await.unwrap().total_progress, 65.0);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_channel_observer_counts_dropped_updates() {
        let (observer, rx) = ChannelProgressObserver::channel(1);
        let counter = observer.dropped_counter();

        observer.on_progress_update(update(ProcessStep::DurationEstimation, 0.0));
        observer.on_progress_update(update(ProcessStep::PacingAdjustment, 15.0));
        assert_eq!(observer.dropped(), 1);

        drop(rx);
        observer.on_progress_update(update(ProcessStep::TimelineBuilding, 40.0));
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_composite_fans_out() {
        let first = MemoryProgressObserver::new();
        let second = MemoryProgressObserver::new();

        let mut composite = CompositeProgressObserver::new();
        assert!(composite.is_empty());
        composite.add_observer(Box::new(first.clone()));
        composite.add_observer(Box::new(second.clone()));
        assert_eq!(composite.len(), 2);

        composite.on_progress_update(update(ProcessStep::QualityAssessment, 95.0));

        assert_eq!(first.history().len(), 1);
        assert_eq!(second.history().len(), 1);
    }
}
