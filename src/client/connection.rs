use std::{net::SocketAddr, time::Duration};

use mqbroker_error::{BrokerResult as ClientResult, ClientError, ResultExt};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    time::timeout,
};
use tracing::{debug, trace};

use crate::{network::protocol, Command, Response};

/// Клиентское соединение с брокером.
///
/// Брокер обслуживает один запрос на соединение, поэтому соединение
/// используется для одного обмена и затем закрывается.
pub struct ClientConnection {
    /// Адрес сервера
    addr: SocketAddr,
    /// Читающая часть соединения с буферизацией
    reader: BufReader<OwnedReadHalf>,
    /// Пишущая часть соединения с буферизацией
    writer: BufWriter<OwnedWriteHalf>,
    /// Таймаут чтения
    read_timeout: Duration,
    /// Таймаут записи
    write_timeout: Duration,
    /// Максимальная длина строки ответа
    max_response_bytes: usize,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ClientConnection {
    /// Создаёт новое соединение с сервером.
    pub async fn connect(
        addr: SocketAddr,
        connect_timeout: Duration,
        read_timeout: Duration,
        write_timeout: Duration,
        max_response_bytes: usize,
    ) -> ClientResult<Self> {
        debug!("Connecting to {addr}");

        // Подключаемся с таймаутом
        let stream = timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ClientError::ConnectionTimeout)?
            .map_err(|e| ClientError::ConnectionFailed {
                address: addr.to_string(),
                reason: e.to_string(),
            })?;

        // Разделяем stream на read/write половины
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            addr,
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            read_timeout,
            write_timeout,
            max_response_bytes,
        })
    }

    /// Отправляет строку запроса и закрывает запись.
    pub async fn send_command(
        &mut self,
        command: &Command,
    ) -> ClientResult<()> {
        let mut line = protocol::encode_request(command);
        trace!(request = %line, "Sending request");
        line.push('\n');

        timeout(self.write_timeout, async {
            self.writer.write_all(line.as_bytes()).await?;
            self.writer.flush().await?;
            self.writer.shutdown().await
        })
        .await
        .map_err(|_| ClientError::WriteTimeout)?
        .map_err(ClientError::from)?;

        Ok(())
    }

    /// Получает ответ от сервера
    pub async fn receive_response(&mut self) -> ClientResult<Response> {
        let limit = self.max_response_bytes as u64 + 1;
        let mut buf = Vec::new();

        let n = timeout(
            self.read_timeout,
            (&mut self.reader).take(limit).read_until(b'\n', &mut buf),
        )
        .await
        .map_err(|_| ClientError::ReadTimeout)?
        .map_err(ClientError::from)?;

        if n == 0 {
            return Err(ClientError::ConnectionClosed.into());
        }
        if buf.last() != Some(&b'\n') && buf.len() as u64 >= limit {
            return Err(ClientError::ResponseTooLarge {
                max: self.max_response_bytes,
            }
            .into());
        }

        let line = String::from_utf8(buf).map_err(|e| ClientError::Protocol {
            reason: e.to_string(),
        })?;
        trace!(response = %line.trim_end(), "Response received");

        let response = protocol::parse_response(&line).map_err(|e| ClientError::Protocol {
            reason: e.to_string(),
        })?;
        Ok(response)
    }

    /// Отправляет команду и возвращает ответ.
    pub async fn execute_command(
        mut self,
        command: &Command,
    ) -> ClientResult<Response> {
        let addr = self.addr;
        self.send_command(command)
            .await
            .with_context(|| format!("send {} to {addr}", command.name()))?;
        self.receive_response()
            .await
            .with_context(|| format!("read {} reply from {addr}", command.name()))
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.addr
    }
}
