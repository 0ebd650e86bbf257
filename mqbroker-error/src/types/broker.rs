use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибки предусловий брокера: запрос разобран корректно, но состояние
/// брокера не позволяет его выполнить.
///
/// `Display` совпадает с `<reason>` в ответе `ERROR|<reason>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// PUBLISH в несуществующую тему
    TopicNotFound { topic: String },
    /// UNSUBSCRIBE/RECEIVE без подписки
    NotSubscribed { topic: String },
    /// RECEIVE из пустой очереди
    NoMessages { topic: String },
}

/// Ошибки извлечения сообщения из очереди подписки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Очередь существует, но пуста
    #[error("queue is empty")]
    Empty,
    /// Очереди для подписки нет
    #[error("queue does not exist")]
    Missing,
}

impl BrokerError {
    /// Тема, к которой относится ошибка.
    pub fn topic(&self) -> &str {
        match self {
            Self::TopicNotFound { topic }
            | Self::NotSubscribed { topic }
            | Self::NoMessages { topic } => topic,
        }
    }

    /// Переводит ошибку очереди в ошибку RECEIVE для темы `topic`.
    ///
    /// Пропавшая очередь означает, что подписку уже сняли.
    pub fn from_queue(
        err: QueueError,
        topic: impl Into<String>,
    ) -> Self {
        let topic = topic.into();
        match err {
            QueueError::Empty => Self::NoMessages { topic },
            QueueError::Missing => Self::NotSubscribed { topic },
        }
    }
}

impl std::fmt::Display for BrokerError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::TopicNotFound { .. } => write!(f, "topic does not exist"),
            Self::NotSubscribed { .. } => write!(f, "not subscribed"),
            Self::NoMessages { .. } => write!(f, "no messages available"),
        }
    }
}

impl std::error::Error for BrokerError {}

impl ErrorExt for BrokerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::TopicNotFound { .. } => StatusCode::TopicNotFound,
            Self::NotSubscribed { .. } => StatusCode::NotSubscribed,
            Self::NoMessages { .. } => StatusCode::QueueEmpty,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", "broker".to_string()),
            ("status_code", self.status_code().to_string()),
            ("topic", self.topic().to_string()),
        ]
    }
}

impl ErrorExt for QueueError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Empty => StatusCode::QueueEmpty,
            Self::Missing => StatusCode::QueueMissing,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет, что Display совпадает с причинами протокола.
    #[test]
    fn test_display_matches_wire_reasons() {
        let topic = "news".to_string();
        assert_eq!(
            BrokerError::TopicNotFound {
                topic: topic.clone()
            }
            .to_string(),
            "topic does not exist"
        );
        assert_eq!(
            BrokerError::NotSubscribed {
                topic: topic.clone()
            }
            .to_string(),
            "not subscribed"
        );
        assert_eq!(
            BrokerError::NoMessages { topic }.to_string(),
            "no messages available"
        );
    }

    /// Тест проверяет, что client_message не скрывает ошибки состояния.
    #[test]
    fn test_client_message_is_reason() {
        let err = BrokerError::NotSubscribed {
            topic: "a".to_string(),
        };
        assert_eq!(err.client_message(), "not subscribed");
        assert!(err.status_code().is_state_error());
    }

    /// Тест проверяет маппинг QueueError -> BrokerError для RECEIVE.
    #[test]
    fn test_from_queue_error() {
        assert_eq!(
            BrokerError::from_queue(QueueError::Empty, "t"),
            BrokerError::NoMessages {
                topic: "t".to_string()
            }
        );
        assert_eq!(
            BrokerError::from_queue(QueueError::Missing, "t"),
            BrokerError::NotSubscribed {
                topic: "t".to_string()
            }
        );
    }

    /// Тест проверяет, что metrics_tags содержит тему.
    #[test]
    fn test_metrics_tags_contains_topic() {
        let err = BrokerError::TopicNotFound {
            topic: "sports".to_string(),
        };
        let tags = err.metrics_tags();
        assert!(tags.iter().any(|(k, v)| *k == "topic" && v == "sports"));
    }

    #[test]
    fn test_queue_error_codes() {
        assert_eq!(QueueError::Empty.status_code(), StatusCode::QueueEmpty);
        assert_eq!(QueueError::Missing.status_code(), StatusCode::QueueMissing);
    }
}
