use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde_repr")]
use serde_repr::{Deserialize_repr, Serialize_repr};
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Коды статуса для категоризации ошибок.
///
/// # Диапазоны:
/// - 0xxx: Успех
/// - 1xxx: Общие ошибки
/// - 2xxx: Состояние брокера (темы, подписки, очереди)
/// - 6xxx: Сеть / IO
/// - 8xxx: Протокольные ошибки
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[cfg_attr(feature = "serde_repr", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Успех ===
    Success = 0,

    // === 1xxx: Общие ошибки ===
    Unknown = 1000,
    Unexpected = 1002,
    Internal = 1003,
    InvalidArgs = 1004,
    Rejected = 1005,

    // === 2xxx: Состояние брокера ===
    TopicNotFound = 2010,
    NotSubscribed = 2011,
    QueueEmpty = 2012,
    QueueMissing = 2013,

    // === 6xxx: Сеть/IO ===
    Io = 6000,
    ConnectionClosed = 6001,
    Timeout = 6002,
    ProtocolError = 6003,
    ConnectionFailed = 6004,
    ReadTimeout = 6005,
    WriteTimeout = 6006,
    UnexpectedEof = 6007,

    // === 8xxx: Протокол ===
    InvalidFrame = 8000,
    InvalidCommand = 8001,
    InvalidUtf8 = 8004,
    SizeLimit = 8007,
    ParseError = 8009,
    InvalidAppId = 8012,
    MissingField = 8013,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Пытается получить вариант `StatusCode` из `u32`.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Имеет ли смысл повторить операцию (транспортные сбои).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout
                | Self::ReadTimeout
                | Self::WriteTimeout
                | Self::ConnectionFailed
                | Self::ConnectionClosed
        )
    }

    pub fn is_success(code: u32) -> bool {
        Self::Success as u32 == code
    }

    /// Ошибка состояния брокера: запрос корректен, но предусловие не
    /// выполнено (нет подписки, нет темы, пустая очередь).
    pub fn is_state_error(&self) -> bool {
        (2000..=2999).contains(&self.code())
    }

    /// Ошибка протокола или парсинга (диапазон 8xxx).
    pub fn is_protocol_error(&self) -> bool {
        (8000..=8999).contains(&self.code())
    }

    /// Ошибка транспорта (диапазон 6xxx).
    pub fn is_transport_error(&self) -> bool {
        (6000..=6999).contains(&self.code())
    }

    /// Короткое имя группы кода для структурированных логов.
    pub fn category(&self) -> &'static str {
        if self.is_state_error() {
            "state"
        } else if self.is_protocol_error() {
            "protocol"
        } else if self.is_transport_error() {
            "transport"
        } else if *self == Self::Success {
            "ok"
        } else {
            "general"
        }
    }

    /// Рекомендуемый уровень логирования для данного кода.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::NotSubscribed
            | Self::QueueEmpty
            | Self::QueueMissing
            | Self::TopicNotFound => LogLevel::Debug,
            Self::InvalidArgs
            | Self::Rejected
            | Self::InvalidFrame
            | Self::InvalidCommand
            | Self::InvalidUtf8
            | Self::InvalidAppId
            | Self::MissingField
            | Self::ParseError
            | Self::SizeLimit => LogLevel::Info,
            Self::Internal | Self::Unexpected | Self::Unknown => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        #[cfg(feature = "strum")]
        {
            write!(f, "{} ({})", self.as_ref(), self.code())
        }
        #[cfg(not(feature = "strum"))]
        {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
