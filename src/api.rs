//! Типы и обработчики границы API
//!
//! Транспорт (HTTP, RPC, CLI) выбирает встраивающее приложение; здесь только
//! JSON-совместимые запросы/ответы с теми же именами полей и их обработка.

use serde::{Deserialize, Serialize};

use crate::config::TimingPrecision;
use crate::error::{Result, SyncError};
use crate::models::{CacheStats, SyncMapping, SyncQuality, TextSegment, Timestamp};
use crate::SyncEngine;

/// Запрос на построение разметки (`POST /sync`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    pub book_id: String,
    pub chapter_id: String,
    pub audio_duration: f64,
    pub text_segments: Vec<TextSegment>,
    /// Если не указано, берется `SyncConfig::default_precision`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_precision: Option<TimingPrecision>,
}

impl SyncRequest {
    /// Проверить запрос
    pub fn validate(&self) -> Result<()> {
        validate_ids(&self.book_id, &self.chapter_id)?;
        if !self.audio_duration.is_finite() || self.audio_duration <= 0.0 {
            return Err(SyncError::InvalidInput(format!(
                "audio_duration must be a positive number of seconds, got {}",
                self.audio_duration
            )));
        }
        Ok(())
    }
}

/// Ответ с разметкой главы
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub book_id: String,
    pub chapter_id: String,
    pub timestamps: Vec<Timestamp>,
    pub total_duration: f64,
    pub sync_quality: SyncQuality,
    /// RFC 3339
    pub created_at: String,
}

impl From<&SyncMapping> for SyncResponse {
    fn from(mapping: &SyncMapping) -> Self {
        Self {
            book_id: mapping.book_id.clone(),
            chapter_id: mapping.chapter_id.clone(),
            timestamps: mapping.timestamps.clone(),
            total_duration: mapping.total_duration,
            sync_quality: mapping.sync_quality,
            created_at: mapping.created_at.to_rfc3339(),
        }
    }
}

/// Ручная правка метки сегмента
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingUpdateRequest {
    pub segment_id: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl TimingUpdateRequest {
    pub fn validate(&self) -> Result<()> {
        if self.segment_id.is_empty() {
            return Err(SyncError::InvalidInput("segment_id must not be empty".to_string()));
        }
        if !self.start_time.is_finite() || !self.end_time.is_finite() {
            return Err(SyncError::InvalidInput(format!(
                "timing must be finite, got {}..{}",
                self.start_time, self.end_time
            )));
        }
        if self.start_time < 0.0 || self.end_time < self.start_time {
            return Err(SyncError::InvalidInput(format!(
                "expected 0 <= start_time <= end_time, got {}..{}",
                self.start_time, self.end_time
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingUpdateResponse {
    pub updated: bool,
}

/// Очистка кэша; без `book_id` очищается всё
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheClearRequest {
    #[serde(default)]
    pub book_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheClearResponse {
    pub removed: usize,
}

fn validate_ids(book_id: &str, chapter_id: &str) -> Result<()> {
    if book_id.is_empty() || chapter_id.is_empty() {
        return Err(SyncError::InvalidInput(
            "book_id and chapter_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// `POST /sync`
pub fn create_sync(engine: &SyncEngine, request: &SyncRequest) -> Result<SyncResponse> {
    request.validate()?;
    let precision = request
        .timing_precision
        .unwrap_or(engine.config().default_precision);

    let mapping = engine.create_sync_mapping(
        &request.book_id,
        &request.chapter_id,
        request.audio_duration,
        &request.text_segments,
        precision,
    )?;
    Ok(SyncResponse::from(mapping.as_ref()))
}

/// `GET /sync/{book_id}/{chapter_id}`; пустая разметка считается отсутствующей
pub fn get_sync(engine: &SyncEngine, book_id: &str, chapter_id: &str) -> Result<SyncResponse> {
    let mapping = engine.get_sync_data(book_id, chapter_id);
    if !mapping.is_available() {
        return Err(SyncError::NotFound(format!("{}/{}", book_id, chapter_id)));
    }
    Ok(SyncResponse::from(mapping.as_ref()))
}

/// Ручная правка метки
pub fn update_timing(
    engine: &SyncEngine,
    book_id: &str,
    chapter_id: &str,
    request: &TimingUpdateRequest,
) -> Result<TimingUpdateResponse> {
    validate_ids(book_id, chapter_id)?;
    request.validate()?;
    let updated = engine.update_sync_timing(
        book_id,
        chapter_id,
        &request.segment_id,
        request.start_time,
        request.end_time,
    );
    Ok(TimingUpdateResponse { updated })
}

pub fn clear_cache(engine: &SyncEngine, request: &CacheClearRequest) -> CacheClearResponse {
    CacheClearResponse {
        removed: engine.clear_cache(request.book_id.as_deref()),
    }
}

pub fn cache_stats(engine: &SyncEngine) -> CacheStats {
    engine.get_cache_stats()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_json() -> &'static str {
        r#"{
            "book_id": "book1",
            "chapter_id": "ch1",
            "audio_duration": 10.0,
            "text_segments": [
                {"id": "s1", "text": "Hello world.", "start_char": 0, "end_char": 12, "sentence_index": 0},
                {"id": "s2", "text": "This is a longer test sentence with more words.", "start_char": 13, "end_char": 61, "sentence_index": 1}
            ]
        }"#
    }

    #[test]
    fn test_create_defaults_precision_to_sentence() {
        let engine = SyncEngine::default();
        let request: SyncRequest = serde_json::from_str(request_json()).unwrap();
        assert_eq!(request.timing_precision, None);

        let response = create_sync(&engine, &request).unwrap();
        assert_eq!(response.timestamps.len(), 2);
        assert_eq!(
            engine.get_sync_data("book1", "ch1").precision_level,
            TimingPrecision::Sentence
        );
    }

    #[test]
    fn test_response_field_names() {
        let engine = SyncEngine::default();
        let request: SyncRequest = serde_json::from_str(request_json()).unwrap();
        let response = create_sync(&engine, &request).unwrap();

        let value = serde_json::to_value(&response).unwrap();
        for field in ["book_id", "chapter_id", "timestamps", "total_duration", "sync_quality", "created_at"] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
        let first = &value["timestamps"][0];
        for field in ["segment_id", "start_time", "end_time", "confidence", "text", "word_count"] {
            assert!(first.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn test_invalid_precision_rejected() {
        let json = request_json().replace("\"audio_duration\"", "\"timing_precision\": \"chapter\", \"audio_duration\"");
        assert!(serde_json::from_str::<SyncRequest>(&json).is_err());
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let engine = SyncEngine::default();
        let mut request: SyncRequest = serde_json::from_str(request_json()).unwrap();
        request.audio_duration = 0.0;

        let err = create_sync(&engine, &request).unwrap_err();
        assert!(matches!(err, SyncError::InvalidInput(_)));
        assert!(engine.store().is_empty());
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let engine = SyncEngine::default();
        let err = get_sync(&engine, "book1", "ch1").unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    #[test]
    fn test_get_empty_mapping_is_not_found() {
        let engine = SyncEngine::default();
        let mut request: SyncRequest = serde_json::from_str(request_json()).unwrap();
        request.text_segments.clear();
        let response = create_sync(&engine, &request).unwrap();
        assert_eq!(response.sync_quality, SyncQuality::Poor);

        assert!(matches!(get_sync(&engine, "book1", "ch1"), Err(SyncError::NotFound(_))));
    }

    #[test]
    fn test_update_and_clear() {
        let engine = SyncEngine::default();
        let request: SyncRequest = serde_json::from_str(request_json()).unwrap();
        create_sync(&engine, &request).unwrap();

        let update = TimingUpdateRequest {
            segment_id: "s1".to_string(),
            start_time: 0.0,
            end_time: 2.5,
        };
        assert!(update_timing(&engine, "book1", "ch1", &update).unwrap().updated);
        assert!(!update_timing(&engine, "book2", "ch1", &update).unwrap().updated);

        let bad = TimingUpdateRequest {
            segment_id: "s1".to_string(),
            start_time: 3.0,
            end_time: 2.0,
        };
        assert!(update_timing(&engine, "book1", "ch1", &bad).is_err());

        assert_eq!(cache_stats(&engine).total_mappings, 1);
        let cleared = clear_cache(&engine, &CacheClearRequest { book_id: Some("book1".to_string()) });
        assert_eq!(cleared.removed, 1);
        assert_eq!(cache_stats(&engine).total_mappings, 0);
    }
}
