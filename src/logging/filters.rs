use tracing_subscriber::EnvFilter;

use crate::logging::config::LoggingConfig;

/// Уровень, на который откатывается фильтр при некорректной директиве.
pub const FALLBACK_DIRECTIVE: &str = "info";

/// Собирает `EnvFilter` для subscriber'а.
///
/// Если задан `RUST_LOG`, он имеет приоритет над конфигурацией.
pub fn build_filter_from_config(config: &LoggingConfig) -> EnvFilter {
    if let Ok(env_filter) = EnvFilter::try_from_default_env() {
        return env_filter;
    }
    build_filter_from_directive(&config.build_filter_directive())
}

/// Строит фильтр из директивы, откатываясь на `info`, если директива
/// не разбирается.
pub fn build_filter_from_directive(directive: &str) -> EnvFilter {
    match EnvFilter::try_new(directive) {
        Ok(filter) => filter,
        Err(e) => {
            // subscriber ещё не установлен, поэтому пишем напрямую в stderr
            eprintln!(
                "Invalid log filter directive '{directive}': {e}; falling back to '{FALLBACK_DIRECTIVE}'"
            );
            EnvFilter::new(FALLBACK_DIRECTIVE)
        }
    }
}
