use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Опубликованное сообщение.
///
/// Неизменяемо после создания. Содержимое хранится в `Arc<str>`, так что
/// рассылка одного сообщения по нескольким очередям клонирует только
/// указатель.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    content: Arc<str>,
    created_at: DateTime<Utc>,
    sender: Uuid,
}

impl Message {
    /// Создаёт сообщение с текущим временем (UTC).
    pub fn new(
        content: impl Into<Arc<str>>,
        sender: Uuid,
    ) -> Self {
        Self::with_timestamp(content, sender, Utc::now())
    }

    pub fn with_timestamp(
        content: impl Into<Arc<str>>,
        sender: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            content: content.into(),
            created_at,
            sender,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Идентификатор приложения-отправителя.
    pub fn sender(&self) -> Uuid {
        self.sender
    }
}
