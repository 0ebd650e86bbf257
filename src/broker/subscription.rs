use std::{fmt, sync::Arc};

use uuid::Uuid;

/// Подписка приложения на тему: пара `(app_id, topic)`.
///
/// Две подписки равны, только если совпадают оба поля; хэш строится по обоим
/// полям. Имя темы хранится как `Arc<str>`, поэтому клонирование подписки не
/// копирует строку.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscription {
    app_id: Uuid,
    topic: Arc<str>,
}

impl Subscription {
    pub fn new(
        app_id: Uuid,
        topic: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            app_id,
            topic: topic.into(),
        }
    }

    pub fn app_id(&self) -> Uuid {
        self.app_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Общий ключ темы (без копирования строки).
    pub fn topic_key(&self) -> &Arc<str> {
        &self.topic
    }
}

impl fmt::Display for Subscription {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}@{}", self.app_id, self.topic)
    }
}
