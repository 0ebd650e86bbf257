use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use tracing_appender::non_blocking::{ErrorCounter, WorkerGuard};

/// Метрики для LoggingHandle.
#[derive(Debug, Default)]
pub struct LoggingMetrics {
    /// Флаг активного shutdown
    pub shutdown_in_progress: AtomicBool,
    /// Кол-во flush операций
    pub flush_count: AtomicU64,
}

/// Handle для управления lifecycle логирования.
///
/// Держит guard фонового файлового writer'а: пока handle жив, буфер
/// non-blocking writer'а продолжает сбрасываться на диск.
pub struct LoggingHandle {
    file_guard: Option<WorkerGuard>,
    file_errors: Option<ErrorCounter>,
    pub metrics: Arc<LoggingMetrics>,
    flush_timeout: Duration,
}

/// Статистика логирования.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingStats {
    pub dropped_messages: u64,
    pub flush_count: u64,
    pub shutdown_in_progress: bool,
    pub file_enabled: bool,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl LoggingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_flush(&self) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_flush_count(&self) -> u64 {
        self.flush_count.load(Ordering::Relaxed)
    }

    pub fn is_shutdown_in_progress(&self) -> bool {
        self.shutdown_in_progress.load(Ordering::Acquire)
    }

    fn start_shutdown(&self) {
        self.shutdown_in_progress.store(true, Ordering::Release);
    }
}

impl LoggingHandle {
    /// Создаёт handle без файлового sink'а.
    pub fn console_only() -> Self {
        Self::new(None, None)
    }

    pub fn new(
        file_guard: Option<WorkerGuard>,
        file_errors: Option<ErrorCounter>,
    ) -> Self {
        Self {
            file_guard,
            file_errors,
            metrics: Arc::new(LoggingMetrics::new()),
            flush_timeout: Duration::from_secs(5),
        }
    }

    /// Устанавливает custom flush timeout.
    pub fn with_flush_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.flush_timeout = timeout;
        self
    }

    /// Фиксирует запрос на flush.
    ///
    /// Non-blocking writer сбрасывает буфер сам; окончательный сброс
    /// происходит при shutdown.
    pub fn flush(&self) {
        self.metrics.record_flush();
        tracing::debug!(
            flush_count = self.metrics.get_flush_count(),
            dropped_messages = self.dropped_messages(),
            "Logging flush requested"
        );
    }

    /// Число строк, потерянных файловым writer'ом из-за переполнения канала.
    pub fn dropped_messages(&self) -> u64 {
        self.file_errors
            .as_ref()
            .map(|c| c.dropped_lines() as u64)
            .unwrap_or(0)
    }

    /// Graceful shutdown: сбрасывает буфер файлового writer'а.
    pub fn shutdown(mut self) {
        self.metrics.start_shutdown();

        tracing::info!(
            dropped_messages = self.dropped_messages(),
            total_flushes = self.metrics.get_flush_count(),
            timeout_secs = self.flush_timeout.as_secs(),
            "Initiating logging shutdown"
        );

        let start = Instant::now();
        drop(self.file_guard.take());
        let elapsed = start.elapsed();

        if elapsed > self.flush_timeout {
            eprintln!(
                "WARNING: Logging shutdown took {}ms (timeout: {}ms)",
                elapsed.as_millis(),
                self.flush_timeout.as_millis()
            );
        }
    }

    /// Shutdown из async-контекста: guard сбрасывается в blocking-потоке.
    pub async fn shutdown_async(mut self) {
        self.metrics.start_shutdown();
        let timeout = self.flush_timeout;

        tracing::info!(
            dropped_messages = self.dropped_messages(),
            timeout_ms = timeout.as_millis(),
            "Async logging shutdown initiated"
        );

        let file_guard = self.file_guard.take();
        match tokio::time::timeout(
            timeout,
            tokio::task::spawn_blocking(move || drop(file_guard)),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => eprintln!("Logging shutdown task panicked: {e}"),
            Err(_) => eprintln!(
                "WARNING: Logging shutdown exceeded timeout of {}ms",
                timeout.as_millis()
            ),
        }
    }

    /// Получить текущие метрики
    pub fn get_metrics(&self) -> LoggingStats {
        LoggingStats {
            dropped_messages: self.dropped_messages(),
            flush_count: self.metrics.get_flush_count(),
            shutdown_in_progress: self.metrics.is_shutdown_in_progress(),
            file_enabled: self.file_guard.is_some(),
        }
    }

    pub fn is_shutdown_in_progress(&self) -> bool {
        self.metrics.is_shutdown_in_progress()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации
////////////////////////////////////////////////////////////////////////////////

impl Drop for LoggingHandle {
    fn drop(&mut self) {
        if self.file_guard.is_some() && !self.metrics.is_shutdown_in_progress() {
            eprintln!(
                "WARNING: LoggingHandle dropped without explicit shutdown(). \
                 Some logs may be lost."
            )
        }
    }
}
