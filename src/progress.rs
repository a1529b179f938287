//! Модуль для отслеживания прогресса построения разметки
//!
//! Реализация паттерна Observer: движок держит один общий репортер, а на
//! каждый вызов конвейера создается собственный `ProgressTracker`, так что
//! параллельные вызовы не сбивают друг другу этапы.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// Информация о прогрессе выполнения операции
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Текущий этап операции
    pub step: String,
    /// Процент выполнения текущего этапа (0.0 - 100.0)
    pub step_progress: f32,
    /// Общий процент выполнения всей операции (0.0 - 100.0)
    pub total_progress: f32,
    /// Дополнительная информация о текущем этапе
    pub details: Option<String>,
}

impl ProgressInfo {
    /// Создает новый экземпляр ProgressInfo
    pub fn new(
        step: impl Into<String>,
        step_progress: f32,
        total_progress: f32,
        details: Option<String>,
    ) -> Self {
        Self {
            step: step.into(),
            step_progress: step_progress.clamp(0.0, 100.0),
            total_progress: total_progress.clamp(0.0, 100.0),
            details,
        }
    }
}

/// Трейт для наблюдателя, получающего уведомления о прогрессе
pub trait ProgressObserver: Send + Sync {
    /// Метод, вызываемый при обновлении прогресса
    fn on_progress_update(&self, progress: ProgressInfo);
}

/// Трейт для объекта, рассылающего уведомления о прогрессе
///
/// Репортер разделяется между вызовами движка, поэтому методы принимают `&self`.
pub trait ProgressReporter: Send + Sync {
    /// Добавить наблюдателя; возвращает его идентификатор
    fn add_observer(&self, observer: Box<dyn ProgressObserver>) -> usize;

    /// Уведомить всех наблюдателей о прогрессе
    fn notify_progress(&self, progress: ProgressInfo);
}

/// Синхронная рассылка уведомлений в потоке вызывающего
pub struct DefaultProgressReporter {
    observers: RwLock<HashMap<usize, Box<dyn ProgressObserver>>>,
    next_id: AtomicUsize,
}

impl DefaultProgressReporter {
    /// Создать новый экземпляр DefaultProgressReporter
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Количество подключенных наблюдателей
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }
}

impl Default for DefaultProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for DefaultProgressReporter {
    fn add_observer(&self, observer: Box<dyn ProgressObserver>) -> usize {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.observers.write().insert(id, observer);
        id
    }

    fn notify_progress(&self, progress: ProgressInfo) {
        for observer in self.observers.read().values() {
            observer.on_progress_update(progress.clone());
        }
    }
}

/// Этапы конвейера синхронизации
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessStep {
    /// Подсчет слов и базового темпа
    DurationEstimation,
    /// Поправки темпа по пунктуации и сложности текста
    PacingAdjustment,
    /// Построение временной шкалы
    TimelineBuilding,
    /// Оценка уверенности меток
    ConfidenceScoring,
    /// Нормализация под точную длительность
    Normalization,
    /// Оценка качества разметки
    QualityAssessment,
}

impl ProcessStep {
    /// Получить название этапа в виде строки
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DurationEstimation => "Оценка длительностей",
            Self::PacingAdjustment => "Поправки темпа",
            Self::TimelineBuilding => "Построение временной шкалы",
            Self::ConfidenceScoring => "Оценка уверенности",
            Self::Normalization => "Нормализация",
            Self::QualityAssessment => "Оценка качества",
        }
    }

    /// Доля этапа в общем прогрессе, проценты; сумма по всем этапам равна 100
    pub fn weight(&self) -> f32 {
        match self {
            Self::DurationEstimation => 15.0,
            Self::PacingAdjustment => 25.0,
            Self::TimelineBuilding => 25.0,
            Self::ConfidenceScoring => 15.0,
            Self::Normalization => 15.0,
            Self::QualityAssessment => 5.0,
        }
    }
}

struct TrackerState {
    current_step: ProcessStep,
    step_progress: f32,
    /// Вес уже завершенных этапов
    completed: HashMap<ProcessStep, f32>,
    finished: bool,
}

impl TrackerState {
    fn total(&self) -> f32 {
        if self.finished {
            return 100.0;
        }
        let done: f32 = self.completed.values().sum();
        let current = if self.completed.contains_key(&self.current_step) {
            0.0
        } else {
            self.current_step.weight() * self.step_progress / 100.0
        };
        (done + current).clamp(0.0, 100.0)
    }
}

/// Прогресс одного прохода конвейера
///
/// Метка (`book/chapter`) дописывается в `details` каждого уведомления,
/// чтобы наблюдатели общего репортера различали параллельные вызовы.
pub struct ProgressTracker {
    reporter: Option<Arc<dyn ProgressReporter>>,
    label: Option<String>,
    state: Mutex<TrackerState>,
}

impl ProgressTracker {
    /// Трекер без репортера: прогресс считается, но никуда не отправляется
    pub fn new() -> Self {
        Self {
            reporter: None,
            label: None,
            state: Mutex::new(TrackerState {
                current_step: ProcessStep::DurationEstimation,
                step_progress: 0.0,
                completed: HashMap::new(),
                finished: false,
            }),
        }
    }

    /// Создать трекер, отправляющий уведомления в `reporter`
    pub fn with_reporter(reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            reporter: Some(reporter),
            ..Self::new()
        }
    }

    /// Задать метку вызова
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Установить текущий этап; предыдущий считается завершенным
    pub fn set_step(&self, step: ProcessStep) {
        let info = {
            let mut state = self.state.lock();
            if state.current_step == step {
                return;
            }
            let previous = state.current_step;
            state.completed.insert(previous, previous.weight());
            state.current_step = step;
            state.step_progress = 0.0;
            self.snapshot(&state, None)
        };
        self.send(info);
    }

    /// Обновить прогресс текущего этапа
    pub fn update_step_progress(&self, progress: f32, details: Option<String>) {
        let info = {
            let mut state = self.state.lock();
            state.step_progress = progress.clamp(0.0, 100.0);
            self.snapshot(&state, details)
        };
        self.send(info);
    }

    /// Отметить завершение всего процесса
    pub fn complete(&self) {
        let info = {
            let mut state = self.state.lock();
            let current = state.current_step;
            state.completed.insert(current, current.weight());
            state.step_progress = 100.0;
            state.finished = true;
            self.snapshot(&state, Some("Процесс завершен".to_string()))
        };
        self.send(info);
    }

    /// Текущий общий прогресс
    pub fn total_progress(&self) -> f32 {
        self.state.lock().total()
    }

    fn snapshot(&self, state: &TrackerState, details: Option<String>) -> ProgressInfo {
        let details = match (&self.label, details) {
            (Some(label), Some(details)) => Some(format!("{}: {}", label, details)),
            (Some(label), None) => Some(label.clone()),
            (None, details) => details,
        };
        ProgressInfo::new(
            state.current_step.as_str(),
            state.step_progress,
            state.total(),
            details,
        )
    }

    // Наблюдатели вызываются вне блокировки состояния
    fn send(&self, info: ProgressInfo) {
        if let Some(reporter) = &self.reporter {
            reporter.notify_progress(info);
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::MemoryProgressObserver;

    fn tracker_with_memory() -> (ProgressTracker, MemoryProgressObserver) {
        let observer = MemoryProgressObserver::new();
        let reporter = DefaultProgressReporter::new();
        reporter.add_observer(Box::new(observer.clone()));
        (ProgressTracker::with_reporter(Arc::new(reporter)), observer)
    }

    #[test]
    fn test_weights_cover_whole_pipeline() {
        let total: f32 = [
            ProcessStep::DurationEstimation,
            ProcessStep::PacingAdjustment,
            ProcessStep::TimelineBuilding,
            ProcessStep::ConfidenceScoring,
            ProcessStep::Normalization,
            ProcessStep::QualityAssessment,
        ]
        .iter()
        .map(ProcessStep::weight)
        .sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn test_step_progress_accumulates_by_weight() {
        let (tracker, observer) = tracker_with_memory();

        tracker.update_step_progress(50.0, None);
        tracker.set_step(ProcessStep::PacingAdjustment);
        // Повторная установка того же этапа не рассылает уведомление
        tracker.set_step(ProcessStep::PacingAdjustment);
        tracker.update_step_progress(40.0, Some("half".to_string()));

        let history = observer.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].step, ProcessStep::DurationEstimation.as_str());
        assert_eq!(history[0].total_progress, 7.5);
        assert_eq!(history[1].step, ProcessStep::PacingAdjustment.as_str());
        assert_eq!(history[1].total_progress, 15.0);
        assert_eq!(history[2].total_progress, 25.0);
        assert_eq!(history[2].details.as_deref(), Some("half"));
    }

    #[test]
    fn test_complete_reports_full_progress() {
        let (tracker, observer) = tracker_with_memory();
        tracker.set_step(ProcessStep::Normalization);
        tracker.complete();

        assert_eq!(tracker.total_progress(), 100.0);
        let last = observer.history().pop().unwrap();
        assert_eq!(last.total_progress, 100.0);
        assert_eq!(last.details.as_deref(), Some("Процесс завершен"));
    }

    #[test]
    fn test_label_prefixes_details() {
        let observer = MemoryProgressObserver::new();
        let reporter = DefaultProgressReporter::new();
        reporter.add_observer(Box::new(observer.clone()));
        let tracker = ProgressTracker::with_reporter(Arc::new(reporter)).with_label("book/ch1");

        tracker.set_step(ProcessStep::TimelineBuilding);
        tracker.update_step_progress(10.0, Some("3 segments".to_string()));

        let history = observer.history();
        assert_eq!(history[0].details.as_deref(), Some("book/ch1"));
        assert_eq!(history[1].details.as_deref(), Some("book/ch1: 3 segments"));
    }

    #[test]
    fn test_tracker_without_reporter_still_counts() {
        let tracker = ProgressTracker::new();
        tracker.set_step(ProcessStep::TimelineBuilding);
        assert_eq!(tracker.total_progress(), 15.0);
    }
}
