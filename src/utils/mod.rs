//! Вспомогательные функции

pub mod logger;
