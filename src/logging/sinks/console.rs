use tracing_subscriber::registry::LookupSpan;

use crate::logging::{
    config::LoggingConfig,
    formatter::{self, BoxedLayer},
};

/// Создаёт консольный слой (stdout) в формате из конфигурации.
pub fn layer_with_config<S>(config: &LoggingConfig) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    formatter::build_formatter(
        &config.console,
        config.format,
        std::io::stdout,
        config.console.with_ansi,
    )
}
