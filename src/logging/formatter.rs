use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::Layer as LayerTrait,
    registry::LookupSpan,
};

use crate::logging::config::{ConsoleConfig, LogFormat};

/// Boxed слой форматирования, стирающий конкретный тип формата.
pub type BoxedLayer<S> = Box<dyn LayerTrait<S> + Send + Sync>;

/// Строит fmt-слой в нужном формате поверх произвольного writer'а.
///
/// Консольный и файловый sink используют одну и ту же функцию, отличаясь
/// только writer'ом и флагом `with_ansi`.
pub fn build_formatter<S, W>(
    options: &ConsoleConfig,
    format: LogFormat,
    writer: W,
    with_ansi: bool,
) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .event_format(fmt::format().json().with_current_span(true))
                .fmt_fields(fmt::format::JsonFields::new())
                .with_writer(writer)
                .with_ansi(false)
                .with_target(options.with_target)
                .with_thread_ids(options.with_thread_ids)
                .with_line_number(options.with_line_numbers);
            Box::new(layer)
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(writer)
                .with_ansi(with_ansi)
                .with_target(options.with_target)
                .with_thread_ids(options.with_thread_ids)
                .with_line_number(options.with_line_numbers);
            Box::new(layer)
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(writer)
                .with_ansi(with_ansi)
                .with_target(options.with_target)
                .with_thread_ids(options.with_thread_ids)
                .with_line_number(options.with_line_numbers);
            Box::new(layer)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::{prelude::*, Registry};

    use super::*;

    #[derive(Clone)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Buffer {
        fn write(
            &mut self,
            buf: &[u8],
        ) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn render(format: LogFormat) -> String {
        let buffer = Buffer(Arc::new(Mutex::new(Vec::new())));
        let out = buffer.0.clone();
        let writer = move || buffer.clone();
        let layer = build_formatter::<Registry, _>(&ConsoleConfig::default(), format, writer, false);

        tracing::subscriber::with_default(Registry::default().with(layer), || {
            tracing::info!(topic = "news", "message published");
        });
        let bytes = out.lock().unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Тест проверяет, что JSON-формат выдаёт разбираемый объект с полями.
    #[test]
    fn test_json_format_is_parseable() {
        let out = render(LogFormat::Json);
        let line = out.lines().next().expect("one event expected");
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["fields"]["message"], "message published");
        assert_eq!(value["fields"]["topic"], "news");
    }

    /// Тест проверяет, что compact и pretty содержат текст события.
    #[test]
    fn test_text_formats_contain_message() {
        for format in [LogFormat::Compact, LogFormat::Pretty] {
            let out = render(format);
            assert!(out.contains("message published"), "format {format}: {out}");
            assert!(out.contains("news"), "format {format}: {out}");
        }
    }
}
