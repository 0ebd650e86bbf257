use std::{
    io::ErrorKind,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use bytes::{Bytes, BytesMut};
use mqbroker_error::ProtocolError;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    select,
    sync::{watch, OwnedSemaphorePermit, Semaphore},
    time::{timeout, Instant},
};
use tracing::{debug, error, info, trace, warn};

use super::protocol;
use crate::{Dispatcher, Response};

/// Конфигурация для обработки соединений
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Максимальное кол-во одновременных соединений (0 — без ограничения)
    pub max_connections: usize,
    /// Таймаут чтения запроса
    pub read_timeout: Duration,
    /// Таймаут записи ответа
    pub write_timeout: Duration,
    /// Максимальный размер запроса в байтах (без `\n`)
    pub max_request_bytes: usize,
    /// Начальный размер буфера для чтения
    pub read_buffer_size: usize,
}

/// Менеджер соединений: лимит одновременных соединений и graceful shutdown.
#[derive(Debug)]
pub struct ConnectionManager {
    config: ConnectionConfig,
    dispatcher: Dispatcher,
    /// Семафор для ограничения числа соединений (нет при `max_connections ==
    /// 0`)
    connection_limit: Option<Arc<Semaphore>>,
    /// Общий счётчик активных соединений
    active_connections: Arc<AtomicUsize>,
    /// Флаг остановки. `watch` хранит значение, поэтому его видят и
    /// обработчики, запущенные после вызова `shutdown`.
    shutdown_tx: watch::Sender<bool>,
    /// Счётчик для генерации ID соединений
    connection_counter: AtomicU64,
}

/// Обработчик одного соединения: один запрос, один ответ.
pub struct ConnectionHandler {
    connection_id: u64,
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    addr: SocketAddr,
    dispatcher: Dispatcher,
    config: ConnectionConfig,
    shutdown_rx: watch::Receiver<bool>,
}

/// Учёт соединения в счётчике активных. Счётчик уменьшается при drop.
#[derive(Debug)]
pub struct ActiveConnection {
    counter: Arc<AtomicUsize>,
}

/// Результат чтения запроса.
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    /// Строка запроса без `\n`
    Request(Bytes),
    /// Запрос длиннее лимита
    TooLarge(usize),
    /// Клиент закрыл соединение, ничего не отправив
    Closed,
}

impl ConnectionManager {
    pub fn new(
        config: ConnectionConfig,
        dispatcher: Dispatcher,
    ) -> Self {
        let connection_limit =
            (config.max_connections > 0).then(|| Arc::new(Semaphore::new(config.max_connections)));
        Self {
            config,
            dispatcher,
            connection_limit,
            active_connections: Arc::new(AtomicUsize::new(0)),
            shutdown_tx: watch::Sender::new(false),
            connection_counter: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Получение текущее кол-во активных соединений
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Инициализация graceful shutdown
    pub fn shutdown(&self) {
        info!("Initiating graceful shutdown for connection manager");
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Учитывает соединение как активное.
    ///
    /// Вызывается акцептором до `tokio::spawn`, чтобы `wait_for_shutdown` не
    /// пропустил задачу, которая ещё не начала выполняться.
    pub fn track(&self) -> ActiveConnection {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        ActiveConnection {
            counter: self.active_connections.clone(),
        }
    }

    /// Ждать завершения всех активных соединений
    pub async fn wait_for_shutdown(
        &self,
        timeout_duration: Duration,
    ) -> Result<()> {
        let start = Instant::now();

        while self.active_connections() > 0 {
            if start.elapsed() > timeout_duration {
                warn!(
                    active = self.active_connections(),
                    "Shutdown timeout reached with active connections"
                );
                return Err(anyhow!("Shutdown timeout exceeded"));
            }

            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        info!("All connections closed gracefully");
        Ok(())
    }

    /// Пытается занять слот соединения.
    ///
    /// `Ok(None)` означает, что лимит не задан. `Err` — лимит исчерпан.
    pub fn try_admit(&self) -> Result<Option<OwnedSemaphorePermit>> {
        match &self.connection_limit {
            None => Ok(None),
            Some(limit) => limit
                .clone()
                .try_acquire_owned()
                .map(Some)
                .map_err(|_| anyhow!("Maximum connections limit reached")),
        }
    }

    /// Обрабатывает новое соединение
    pub async fn handle_connection(
        &self,
        socket: TcpStream,
        addr: SocketAddr,
        tracked: ActiveConnection,
    ) -> Result<()> {
        let _permit = match self.try_admit() {
            Ok(permit) => permit,
            Err(e) => {
                warn!(%addr, limit = self.config.max_connections, "Rejecting connection: {e}");
                drop(socket);
                return Ok(());
            }
        };

        let connection_count = self.active_connections();
        let connection_id = self.connection_counter.fetch_add(1, Ordering::Relaxed) + 1;

        debug!(
            connection_id,
            %addr,
            active = connection_count,
            "Connection established"
        );

        let handler = ConnectionHandler::new(
            connection_id,
            socket,
            addr,
            self.dispatcher.clone(),
            self.config.clone(),
            self.shutdown_tx.subscribe(),
        );

        let result = handler.run().await;

        drop(tracked);
        let remaining = self.active_connections();

        match &result {
            Ok(_) => debug!(connection_id, %addr, remaining, "Connection closed"),
            Err(e) => error!(
                connection_id,
                %addr,
                remaining,
                "Connection closed with error: {e:#}"
            ),
        }

        result
    }
}

impl ConnectionHandler {
    pub fn new(
        connection_id: u64,
        socket: TcpStream,
        addr: SocketAddr,
        dispatcher: Dispatcher,
        config: ConnectionConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        // Разделяем socket на части для чтения и записи
        let (reader, writer) = socket.into_split();

        Self {
            connection_id,
            reader,
            writer,
            addr,
            dispatcher,
            config,
            shutdown_rx,
        }
    }

    /// Читает один запрос, отвечает и закрывает соединение.
    pub async fn run(self) -> Result<()> {
        // Деструктурируем self чтобы избежать проблем с частичным перемещением
        let ConnectionHandler {
            connection_id,
            mut reader,
            mut writer,
            addr,
            dispatcher,
            config,
            mut shutdown_rx,
        } = self;

        let frame = select! {
            biased;

            true = Self::stopping(&mut shutdown_rx) => {
                info!(connection_id, %addr, "Received shutdown signal");
                let response = Response::error("server shutting down");
                Self::send_response_to_writer(&mut writer, &response, config.write_timeout).await?;
                return Self::graceful_close_writer(connection_id, writer).await;
            }

            read = timeout(
                config.read_timeout,
                Self::read_frame(&mut reader, config.max_request_bytes, config.read_buffer_size),
            ) => read,
        };

        let response = match frame {
            Ok(Ok(Frame::Request(line))) => {
                trace!(connection_id, %addr, bytes = line.len(), "Received request");
                dispatcher.handle_frame(&line, config.max_request_bytes)
            }
            Ok(Ok(Frame::TooLarge(size))) => {
                dispatcher.reject(&ProtocolError::RequestTooLarge {
                    size,
                    max: config.max_request_bytes,
                })
            }
            Ok(Ok(Frame::Closed)) => {
                debug!(connection_id, %addr, "Client closed connection without request");
                return Self::graceful_close_writer(connection_id, writer).await;
            }
            Ok(Err(e)) => {
                if Self::is_recoverable_error(&e) {
                    debug!(connection_id, %addr, "Recoverable read error: {e}");
                    return Self::graceful_close_writer(connection_id, writer).await;
                }
                error!(connection_id, %addr, "Fatal read error: {e}");
                return Err(e.into());
            }
            Err(_) => {
                warn!(connection_id, %addr, "Read timeout");
                Response::error("read timeout")
            }
        };

        if let Err(e) =
            Self::send_response_to_writer(&mut writer, &response, config.write_timeout).await
        {
            warn!(connection_id, %addr, "Failed to send response: {e:#}");
        }

        Self::graceful_close_writer(connection_id, writer).await
    }

    /// Завершается с `true`, когда менеджер переходит в остановку. Если
    /// флаг уже выставлен, возвращает сразу.
    async fn stopping(shutdown_rx: &mut watch::Receiver<bool>) -> bool {
        shutdown_rx.wait_for(|stopping| *stopping).await.is_ok()
    }

    /// Читает байты до `\n` или до закрытия записи клиентом.
    ///
    /// Буфер не растёт больше, чем на один `read` сверх лимита.
    async fn read_frame(
        reader: &mut OwnedReadHalf,
        max_len: usize,
        buffer_size: usize,
    ) -> std::io::Result<Frame> {
        let mut buf = BytesMut::with_capacity(buffer_size.min(max_len + 1).max(64));
        let mut scanned = 0;

        loop {
            if let Some(pos) = buf[scanned..].iter().position(|b| *b == b'\n') {
                let end = scanned + pos;
                if end > max_len {
                    return Ok(Frame::TooLarge(end));
                }
                buf.truncate(end);
                return Ok(Frame::Request(buf.freeze()));
            }
            scanned = buf.len();
            if buf.len() > max_len {
                return Ok(Frame::TooLarge(buf.len()));
            }

            if reader.read_buf(&mut buf).await? == 0 {
                if buf.is_empty() {
                    return Ok(Frame::Closed);
                }
                return Ok(Frame::Request(buf.freeze()));
            }
        }
    }

    /// Отправляет ответ с таймаутом (статический метод)
    async fn send_response_to_writer(
        writer: &mut OwnedWriteHalf,
        response: &Response,
        write_timeout: Duration,
    ) -> Result<()> {
        let line = protocol::encode_response(response);
        timeout(write_timeout, writer.write_all(line.as_bytes()))
            .await
            .context("Write timeout")?
            .context("Failed to write response")?;

        Ok(())
    }

    /// Проверяет, является ли ошибка восстанавливаемой
    fn is_recoverable_error(error: &std::io::Error) -> bool {
        matches!(
            error.kind(),
            ErrorKind::UnexpectedEof
                | ErrorKind::BrokenPipe
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::TimedOut
        )
    }

    /// Graceful закрытие соединения
    async fn graceful_close_writer(
        connection_id: u64,
        mut writer: OwnedWriteHalf,
    ) -> Result<()> {
        if let Err(e) = writer.shutdown().await {
            // Игнорируем ошибки при закрытии уже закрытого соединения
            if e.kind() != ErrorKind::NotConnected {
                debug!(connection_id, "Error during shutdown: {e}");
            }
        }
        Ok(())
    }
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_connections: 0,
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            max_request_bytes: 64 * 1024,
            read_buffer_size: 4096,
        }
    }
}
