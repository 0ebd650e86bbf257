use std::fmt;

use mqbroker_error::ErrorExt;

/// Статус ответа брокера.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

/// Ответ брокера: `OK|<payload>` или `ERROR|<reason>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    payload: String,
}

impl Response {
    pub fn ok(payload: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            payload: payload.into(),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            payload: reason.into(),
        }
    }

    /// Ответ об ошибке с безопасной для клиента причиной.
    pub fn from_error<E: ErrorExt>(err: &E) -> Self {
        Self::error(err.client_message())
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn into_payload(self) -> String {
        self.payload
    }
}

impl fmt::Display for Status {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Строка ответа без завершающего перевода строки.
impl fmt::Display for Response {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}|{}", self.status, self.payload)
    }
}
