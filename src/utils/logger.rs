use env_logger::{Builder, Env};
use std::io::Write;

/// Фильтр по умолчанию, если `RUST_LOG` не задан
pub const DEFAULT_FILTER: &str = "warn,text_audio_sync=info";

/// Инициализировать логгер для приложений, встраивающих библиотеку
///
/// Повторный вызов не паникует: если логгер уже установлен, он остается.
pub fn init_logger() {
    init_logger_with(DEFAULT_FILTER);
}

/// Инициализировать логгер с собственным фильтром по умолчанию
pub fn init_logger_with(default_filter: &str) {
    // Переменная окружения RUST_LOG имеет приоритет над фильтром по умолчанию
    let env = Env::default().filter_or("RUST_LOG", default_filter);

    let result = Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .try_init();

    if result.is_err() {
        log::debug!("Logger already initialized");
    }
}
