use tracing_appender::{
    non_blocking,
    non_blocking::{ErrorCounter, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::registry::LookupSpan;

use crate::{
    error::LoggingError,
    logging::{
        config::LoggingConfig,
        formatter::{self, BoxedLayer},
    },
};

/// Файловый sink: слой, guard фонового writer'а и счётчик потерянных строк.
pub struct FileSink<S> {
    pub layer: BoxedLayer<S>,
    pub guard: WorkerGuard,
    pub errors: ErrorCounter,
}

/// Создаёт файловый слой с ежедневной ротацией.
///
/// Запись идёт через non-blocking writer; `WorkerGuard` должен жить до
/// завершения процесса, иначе хвост буфера потеряется.
pub fn layer_with_config<S>(config: &LoggingConfig) -> Result<FileSink<S>, LoggingError>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let dir = config.log_dir.as_ref().ok_or(LoggingError::FileSinkDisabled)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(config.file_prefix.as_str())
        .build(dir)
        .map_err(|e| LoggingError::Appender(e.to_string()))?;
    let (writer, guard) = non_blocking(appender);
    let errors = writer.error_counter();

    let layer = formatter::build_formatter(&config.console, config.format, writer, false);
    Ok(FileSink {
        layer,
        guard,
        errors,
    })
}
