use std::io;

use crate::{ErrorExt, StatusCode};

/// Ошибки клиента брокера.
#[derive(Debug, Clone)]
pub enum ClientError {
    /// Ошибка подключения к серверу
    ConnectionFailed { address: String, reason: String },
    /// Таймаут подключения
    ConnectionTimeout,
    /// Соединение закрыто сервером до ответа
    ConnectionClosed,
    /// Сервер ответил `ERROR|<message>`
    ServerError { message: String },
    /// Ответ сервера не соответствует протоколу
    UnexpectedResponse { line: String },
    /// Аргумент нельзя передать по протоколу (например, `|` в содержимом)
    InvalidArgument { reason: String },
    /// Ошибка ввода-вывода
    Io {
        kind: io::ErrorKind,
        message: String,
    },
    /// Ошибка протокола
    Protocol { reason: String },
    /// Ответ превышает лимит
    ResponseTooLarge { max: usize },
    /// Таймаут чтения
    ReadTimeout,
    /// Таймаут записи
    WriteTimeout,
}

impl std::fmt::Display for ClientError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed { address, reason } => {
                write!(f, "Failed to connect to {address}: {reason}")
            }
            Self::ConnectionTimeout => write!(f, "Connection timeout"),
            Self::ConnectionClosed => write!(f, "Connection closed by server"),
            Self::ServerError { message } => write!(f, "Server error: {message}"),
            Self::UnexpectedResponse { line } => {
                write!(f, "Unexpected response from server: {line}")
            }
            Self::InvalidArgument { reason } => write!(f, "Invalid argument: {reason}"),
            Self::Io { kind, message } => write!(f, "I/O error ({kind:?}): {message}"),
            Self::Protocol { reason } => write!(f, "Protocol error: {reason}"),
            Self::ResponseTooLarge { max } => {
                write!(f, "Response exceeds limit of {max} bytes")
            }
            Self::ReadTimeout => write!(f, "Read timeout"),
            Self::WriteTimeout => write!(f, "Write timeout"),
        }
    }
}

impl std::error::Error for ClientError {}

impl ErrorExt for ClientError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ConnectionFailed { .. } => StatusCode::ConnectionFailed,
            Self::ConnectionTimeout => StatusCode::Timeout,
            Self::ConnectionClosed => StatusCode::ConnectionClosed,
            Self::ServerError { .. } => StatusCode::Rejected,
            Self::UnexpectedResponse { .. } | Self::Protocol { .. } => StatusCode::ProtocolError,
            Self::InvalidArgument { .. } => StatusCode::InvalidArgs,
            Self::Io { .. } => StatusCode::Io,
            Self::ResponseTooLarge { .. } => StatusCode::SizeLimit,
            Self::ReadTimeout => StatusCode::ReadTimeout,
            Self::WriteTimeout => StatusCode::WriteTimeout,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::ConnectionFailed { address, .. } => {
                format!("Failed to connect to {address}")
            }
            Self::ServerError { message } => message.clone(),
            Self::Io { .. } => "Network error occurred".to_string(),
            other => other.to_string(),
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "client".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::ConnectionFailed { address, .. } => {
                tags.push(("address", address.clone()));
            }
            Self::Io { kind, .. } => {
                tags.push(("io_kind", format!("{kind:?}")));
            }
            _ => {}
        }

        tags
    }
}

// Конверсия из io::Error
impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
