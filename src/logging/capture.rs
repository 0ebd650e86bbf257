//! Перехват вывода `tracing` в строку для тестов.

use std::sync::{Arc, Mutex};

use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

#[derive(Clone)]
struct VecMakeWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> fmt::MakeWriter<'a> for VecMakeWriter {
    type Writer = VecWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        VecWriterGuard(self.0.clone())
    }
}

struct VecWriterGuard(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for VecWriterGuard {
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

/// Выполняет `f` с локальным subscriber'ом и возвращает всё, что он записал.
pub(crate) fn capture_logs<F: FnOnce()>(
    filter: EnvFilter,
    f: F,
) -> String {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let layer = fmt::layer()
        .with_ansi(false)
        .with_writer(VecMakeWriter(buffer.clone()))
        .with_filter(filter);
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let out = buffer.lock().unwrap();
    String::from_utf8_lossy(&out).into_owned()
}
