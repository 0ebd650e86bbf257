use std::{fmt, panic::Location, sync::Arc};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{ErrorExt, LogLevel, StatusCode};

/// Корневая ошибка плюс цепочка контекстов, накопленная по пути наверх.
///
/// Корень неизменяем и разделяется через `Arc`, поэтому клонирование
/// копирует только цепочку. Порядок контекстов в цепочке: от самого
/// внутреннего к самому внешнему.
#[derive(Clone)]
pub struct StackError {
    root: Arc<dyn ErrorExt>,
    trail: Vec<ContextFrame>,
}

/// Один шаг цепочки: что делал вызывающий код и где.
#[derive(Debug, Clone)]
pub struct ContextFrame {
    pub message: String,
    pub location: &'static Location<'static>,
}

/// Машиночитаемое описание ошибки для `--output json` в CLI.
#[cfg(feature = "serde")]
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub code: u32,
    pub kind: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StackError {
    pub fn new<E: ErrorExt>(err: E) -> Self {
        Self {
            root: Arc::new(err),
            trail: Vec::new(),
        }
    }

    /// Добавляет внешний контекст и запоминает место вызова.
    #[track_caller]
    pub fn context(
        mut self,
        msg: impl Into<String>,
    ) -> Self {
        self.trail.push(ContextFrame {
            message: msg.into(),
            location: Location::caller(),
        });
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.root.status_code()
    }

    /// Текст для `ERROR|<reason>`: только корневая ошибка, без контекстов.
    pub fn client_message(&self) -> String {
        self.root.client_message()
    }

    pub fn root(&self) -> &dyn ErrorExt {
        self.root.as_ref()
    }

    pub fn contexts(&self) -> &[ContextFrame] {
        &self.trail
    }

    pub fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = self.root.metrics_tags();
        if let Some(outer) = self.trail.last() {
            tags.push(("context", outer.message.clone()));
        }
        tags
    }

    pub fn downcast_ref<T: ErrorExt>(&self) -> Option<&T> {
        self.root.as_any().downcast_ref::<T>()
    }

    pub fn log_level(&self) -> LogLevel {
        self.status_code().log_level()
    }

    /// Имеет ли смысл повторить запрос к брокеру (таймауты, обрывы связи).
    pub fn is_retryable(&self) -> bool {
        self.status_code().is_retryable()
    }

    /// Многострочный отчёт: корень, затем контексты изнутри наружу с
    /// местами вызова. Используется в подробном выводе CLI.
    pub fn report(&self) -> String {
        let mut out = format!("{} [{}]", self.root, self.status_code());
        for frame in &self.trail {
            out.push_str("\n  while ");
            out.push_str(&frame.to_string());
        }
        out
    }

    #[cfg(feature = "serde")]
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            status: "error",
            code: self.status_code().code(),
            kind: self.root.type_name(),
            reason: self.client_message(),
            context: self.trail.iter().rev().map(|f| f.message.clone()).collect(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StackError
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for ContextFrame {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{} ({}:{})",
            self.message,
            self.location.file(),
            self.location.line()
        )
    }
}

impl fmt::Debug for StackError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("StackError")
            .field("root", &self.root.log_message())
            .field("status_code", &self.status_code())
            .field("trail", &self.trail)
            .finish()
    }
}

/// Внешний контекст печатается первым: `send SUBSCRIBE: read timeout`.
impl fmt::Display for StackError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for frame in self.trail.iter().rev() {
            write!(f, "{}: ", frame.message)?;
        }
        write!(f, "{}", self.root)
    }
}

impl std::error::Error for StackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.root.as_ref())
    }
}

impl<E: ErrorExt> From<E> for StackError {
    fn from(e: E) -> Self {
        StackError::new(e)
    }
}

impl From<StackError> for std::io::Error {
    fn from(e: StackError) -> Self {
        std::io::Error::other(e.to_string())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
