use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибки разбора запроса `CMD|appId|topic[|content[|sender]]`.
///
/// `Display` совпадает с `<reason>` в ответе `ERROR|<reason>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Пустая строка запроса
    EmptyRequest,
    /// Меньше трёх полей
    TooFewFields { found: usize },
    /// Неизвестная команда
    UnknownCommand { command: String },
    /// Идентификатор приложения не является UUID
    InvalidAppId { value: String },
    /// Пустое имя темы
    MissingTopic,
    /// PUBLISH без содержимого
    MissingContent,
    /// Запрос превышает лимит
    RequestTooLarge { size: usize, max: usize },
    /// Запрос не является корректным UTF-8
    InvalidUtf8,
    /// Ответ сервера не удалось разобрать
    MalformedResponse { line: String },
}

impl std::fmt::Display for ProtocolError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::EmptyRequest => write!(f, "empty request"),
            Self::TooFewFields { found } => {
                write!(f, "malformed request: expected at least 3 fields, got {found}")
            }
            Self::UnknownCommand { command } => write!(f, "unknown command: {command}"),
            Self::InvalidAppId { value } => write!(f, "invalid application id: {value}"),
            Self::MissingTopic => write!(f, "missing topic"),
            Self::MissingContent => write!(f, "missing content"),
            Self::RequestTooLarge { .. } => write!(f, "request too large"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::MalformedResponse { line } => write!(f, "malformed response: {line}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl ErrorExt for ProtocolError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyRequest | Self::TooFewFields { .. } => StatusCode::InvalidFrame,
            Self::UnknownCommand { .. } => StatusCode::InvalidCommand,
            Self::InvalidAppId { .. } => StatusCode::InvalidAppId,
            Self::MissingTopic | Self::MissingContent => StatusCode::MissingField,
            Self::RequestTooLarge { .. } => StatusCode::SizeLimit,
            Self::InvalidUtf8 => StatusCode::InvalidUtf8,
            Self::MalformedResponse { .. } => StatusCode::ParseError,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn log_message(&self) -> String {
        match self {
            Self::RequestTooLarge { size, max } => {
                format!("request of {size} bytes exceeds limit of {max} bytes")
            }
            other => other.to_string(),
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "protocol".to_string()),
            ("status_code", self.status_code().to_string()),
        ];
        if let Self::UnknownCommand { command } = self {
            tags.push(("command", command.clone()));
        }
        tags
    }
}
