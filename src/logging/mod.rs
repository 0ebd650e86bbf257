#[cfg(test)]
pub(crate) mod capture;
pub mod config;
mod filters;
mod formatter;
pub mod handle;
pub mod sinks;

pub use config::{ConsoleConfig, LogFormat, LoggingConfig};
pub use filters::{build_filter_from_config, FALLBACK_DIRECTIVE};
pub use formatter::BoxedLayer;
pub use handle::{LoggingHandle, LoggingMetrics, LoggingStats};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::LoggingError;

/// Инициализирует глобальный subscriber: фильтр, консольный слой и, если
/// задан каталог логов, файловый слой с ежедневной ротацией.
///
/// Возвращённый handle нужно держать до завершения процесса и закрыть
/// через [`LoggingHandle::shutdown`].
pub fn init_logging(config: LoggingConfig) -> Result<LoggingHandle, LoggingError> {
    config.validate()?;
    config.ensure_log_dir()?;

    let env_filter = filters::build_filter_from_config(&config);
    let mut layers = Vec::new();

    if config.console.enabled {
        layers.push(sinks::console::layer_with_config(&config));
    }

    let (file_guard, file_errors) = if config.file_enabled() {
        let sink = sinks::file::layer_with_config(&config)?;
        layers.push(sink.layer);
        (Some(sink.guard), Some(sink.errors))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        log_format = %config.format,
        log_dir = ?config.log_dir,
        console_enabled = config.console.enabled,
        file_enabled = config.file_enabled(),
        "Logging system initialized"
    );

    Ok(LoggingHandle::new(file_guard, file_errors))
}
