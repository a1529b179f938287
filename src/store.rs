//! Хранилище разметок синхронизации
//!
//! Хранит последнюю рассчитанную разметку для каждой пары (книга, глава).
//! Разметки неизменяемы: изменение публикуется заменой `Arc<SyncMapping>`
//! под блокировкой конкретного ключа. Данные живут только в памяти процесса.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::{CacheStats, SyncMapping};

/// Ключ разметки
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncKey {
    pub book_id: String,
    pub chapter_id: String,
}

impl SyncKey {
    pub fn new(book_id: impl Into<String>, chapter_id: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            chapter_id: chapter_id.into(),
        }
    }
}

type Slot = Arc<RwLock<Arc<SyncMapping>>>;

fn snapshot(slot: &Slot) -> Arc<SyncMapping> {
    Arc::clone(&*slot.read())
}

/// Хранилище разметок в памяти
///
/// Жизненный цикл: `new` при старте, `clear`/`remove_book` по запросу,
/// `teardown` при остановке. Запись новой разметки для существующего ключа
/// работает по правилу "последний записавший побеждает"; изменения одной
/// разметки сериализуются блокировкой её ключа.
pub struct SyncStore {
    entries: RwLock<HashMap<SyncKey, Slot>>,
}

impl SyncStore {
    /// Создать пустое хранилище
    pub fn new() -> Self {
        log::info!("Sync store initialized");
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &SyncKey) -> Option<Slot> {
        self.entries.read().get(key).cloned()
    }

    /// Получить разметку
    pub fn get(&self, book_id: &str, chapter_id: &str) -> Option<Arc<SyncMapping>> {
        let key = SyncKey::new(book_id, chapter_id);
        self.slot(&key).as_ref().map(snapshot)
    }

    /// Сохранить разметку, заменив предыдущую для той же главы
    pub fn insert(&self, mapping: SyncMapping) -> Arc<SyncMapping> {
        let key = SyncKey::new(&mapping.book_id, &mapping.chapter_id);
        let mapping = Arc::new(mapping);

        if let Some(slot) = self.slot(&key) {
            *slot.write() = Arc::clone(&mapping);
            return mapping;
        }

        let mut entries = self.entries.write();
        match entries.get(&key) {
            Some(slot) => *slot.write() = Arc::clone(&mapping),
            None => {
                entries.insert(key, Arc::new(RwLock::new(Arc::clone(&mapping))));
            }
        }
        mapping
    }

    /// Заменить разметку результатом `f`
    ///
    /// `f` получает текущую разметку под блокировкой её ключа и возвращает
    /// новую версию или `None`, если менять нечего. Возвращает `true`, если
    /// разметка была заменена.
    pub fn modify<F>(&self, book_id: &str, chapter_id: &str, f: F) -> bool
    where
        F: FnOnce(&SyncMapping) -> Option<SyncMapping>,
    {
        let Some(slot) = self.slot(&SyncKey::new(book_id, chapter_id)) else {
            return false;
        };

        let mut current = slot.write();
        match f(&current) {
            Some(updated) => {
                *current = Arc::new(updated);
                true
            }
            None => false,
        }
    }

    /// Удалить все разметки книги
    pub fn remove_book(&self, book_id: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| key.book_id != book_id);
        before - entries.len()
    }

    /// Удалить все разметки
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let removed = entries.len();
        entries.clear();
        removed
    }

    /// Завершить работу хранилища
    pub fn teardown(self) -> usize {
        let removed = self.entries.into_inner().len();
        log::info!("Sync store shut down, dropped {} mappings", removed);
        removed
    }

    /// Количество разметок
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Статистика хранилища
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let books: HashSet<&str> = entries.keys().map(|key| key.book_id.as_str()).collect();
        let approx_size_bytes: usize = entries
            .values()
            .map(|slot| {
                serde_json::to_vec(snapshot(slot).as_ref())
                    .map(|bytes| bytes.len())
                    .unwrap_or(0)
            })
            .sum();

        CacheStats {
            total_mappings: entries.len(),
            distinct_books: books.len(),
            approx_size_bytes,
            cache_size_mb: approx_size_bytes as f64 / (1024.0 * 1024.0),
        }
    }
}

impl Default for SyncStore {
    fn default() -> Self {
        Self::new()
    }
}
