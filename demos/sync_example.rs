//! Пример построения разметки с отслеживанием прогресса
//!
//! Запуск: `cargo run --example sync_example [request.json]`. Без аргумента
//! используется встроенный запрос. Прогресс передается через канал tokio в
//! отдельную задачу, которая печатает этапы по мере поступления.

use std::sync::Arc;

use anyhow::Context;
use text_audio_sync::{
    api::{self, CacheClearRequest, SyncRequest, TimingUpdateRequest},
    notification::{
        ChannelProgressObserver, CompositeProgressObserver, LogProgressObserver,
        MemoryProgressObserver,
    },
    progress::{DefaultProgressReporter, ProgressReporter},
    utils::logger,
    SyncConfig, SyncEngine, SyncStore,
};

const SAMPLE_REQUEST: &str = r#"{
    "book_id": "book42",
    "chapter_id": "chapter-1",
    "audio_duration": 21.5,
    "timing_precision": "sentence",
    "text_segments": [
        {"id": "s1", "text": "It was a bright cold day in April, and the clocks were striking thirteen."},
        {"id": "s2", "text": "Winston Smith slipped quickly through the glass doors of Victory Mansions."},
        {"id": "s3", "text": "\"Not again,\" he muttered."},
        {"id": "s4", "text": "The hallway smelt of boiled cabbage and old rag mats..."}
    ]
}"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init_logger_with("info,text_audio_sync=debug");

    let request_json = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read request file {}", path))?,
        None => SAMPLE_REQUEST.to_string(),
    };
    let request: SyncRequest =
        serde_json::from_str(&request_json).context("failed to parse sync request")?;

    // Наблюдатели прогресса: лог, история в памяти и канал для асинхронного потребителя
    let memory = MemoryProgressObserver::new();
    let (channel, mut progress_rx) = ChannelProgressObserver::channel(32);
    let dropped = channel.dropped_counter();

    let mut composite = CompositeProgressObserver::new();
    composite.add_observer(Box::new(LogProgressObserver::with_prefix("[sync] ")));
    composite.add_observer(Box::new(memory.clone()));
    composite.add_observer(Box::new(channel));

    let reporter = DefaultProgressReporter::new();
    reporter.add_observer(Box::new(composite));

    let printer = tokio::spawn(async move {
        let mut received = 0;
        while let Some(progress) = progress_rx.recv().await {
            received += 1;
            println!("  {:>5.1}% {}", progress.total_progress, progress.step);
        }
        received
    });

    let store = Arc::new(SyncStore::new());
    let engine = SyncEngine::with_progress_reporter(
        SyncConfig::default(),
        Arc::clone(&store),
        Arc::new(reporter),
    );

    let response = api::create_sync(&engine, &request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    println!("Progress updates received: {}", memory.history().len());

    if let Some(first) = response.timestamps.first() {
        let correction = TimingUpdateRequest {
            segment_id: first.segment_id.clone(),
            start_time: first.start_time,
            end_time: first.end_time + 0.25,
        };
        let result = api::update_timing(&engine, &request.book_id, &request.chapter_id, &correction)?;
        println!("Manual correction applied: {}", result.updated);
    }

    println!("Cache stats: {}", serde_json::to_string(&api::cache_stats(&engine))?);

    let cleared = api::clear_cache(
        &engine,
        &CacheClearRequest {
            book_id: Some(request.book_id.clone()),
        },
    );
    println!("Cleared {} mappings", cleared.removed);

    // Движок владеет репортером, а через него и отправителем канала
    drop(engine);
    let streamed = printer.await.context("progress printer task failed")?;
    println!(
        "Progress updates streamed: {}, dropped: {}",
        streamed,
        dropped.load(std::sync::atomic::Ordering::Relaxed)
    );

    if let Ok(store) = Arc::try_unwrap(store) {
        store.teardown();
    }

    Ok(())
}
