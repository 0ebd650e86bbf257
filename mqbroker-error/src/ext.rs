use std::{any::Any, error::Error};

use crate::StatusCode;

/// Общий интерфейс для всех ошибок брокера и клиента.
///
/// Трейт object-safe: [`crate::StackError`] хранит корневую ошибку как
/// `Arc<dyn ErrorExt>` и обращается к ней только через эти методы.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус-код ошибки. Без переопределения ошибка считается внутренней.
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    fn as_any(&self) -> &dyn Any;

    /// Текст, который попадает в ответ `ERROR|<reason>`.
    ///
    /// Ошибки с внутренними кодами (`Unknown`, `Internal`, `Unexpected`)
    /// наружу не раскрываются и заменяются на `internal error`.
    fn client_message(&self) -> String {
        if self.is_internal() {
            String::from("internal error")
        } else {
            self.to_string()
        }
    }

    /// Ошибка вызвана запросом клиента (плохой кадр, неизвестная тема,
    /// пустая очередь), а не сбоем внутри брокера или транспорта.
    fn is_client_fault(&self) -> bool {
        let code = self.status_code();
        code.is_protocol_error() || code.is_state_error() || code == StatusCode::InvalidArgs
    }

    fn is_internal(&self) -> bool {
        matches!(
            self.status_code(),
            StatusCode::Unknown | StatusCode::Internal | StatusCode::Unexpected
        )
    }

    /// Полное описание для логов, включая поля варианта.
    fn log_message(&self) -> String {
        format!("{self:?}")
    }

    /// Поля для структурированного лога.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let origin = if self.is_client_fault() {
            "client"
        } else {
            "broker"
        };
        vec![
            ("error_type", self.type_name()),
            ("status_code", self.status_code().code().to_string()),
            ("category", self.status_code().category().to_string()),
            ("origin", origin.to_string()),
        ]
    }

    /// Имя типа без пути модуля, например `BrokerError`.
    fn type_name(&self) -> String {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full).to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::{any::Any, error::Error, fmt};

    use super::*;

    #[derive(Debug)]
    struct QueueLockPoisoned;

    impl fmt::Display for QueueLockPoisoned {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "queue lock poisoned for subscriber 42")
        }
    }

    impl Error for QueueLockPoisoned {}

    impl ErrorExt for QueueLockPoisoned {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    enum RequestError {
        UnknownTopic,
        ReadTimeout,
    }

    impl fmt::Display for RequestError {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            match self {
                Self::UnknownTopic => write!(f, "topic does not exist"),
                Self::ReadTimeout => write!(f, "read timeout"),
            }
        }
    }

    impl Error for RequestError {}

    impl ErrorExt for RequestError {
        fn status_code(&self) -> StatusCode {
            match self {
                Self::UnknownTopic => StatusCode::TopicNotFound,
                Self::ReadTimeout => StatusCode::ReadTimeout,
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Тест проверяет, что ошибка без собственного кода считается внутренней
    /// и её текст не уходит клиенту.
    #[test]
    fn test_unclassified_error_is_masked() {
        let err = QueueLockPoisoned;
        assert_eq!(err.status_code(), StatusCode::Internal);
        assert!(err.is_internal());
        assert_eq!(err.client_message(), "internal error");
        assert!(err.log_message().contains("QueueLockPoisoned"));
    }

    /// Тест проверяет, что ошибка состояния брокера уходит клиенту как есть.
    #[test]
    fn test_state_error_reaches_client_verbatim() {
        let err = RequestError::UnknownTopic;
        assert_eq!(err.client_message(), "topic does not exist");
        assert!(err.is_client_fault());
        assert!(!err.is_internal());
    }

    /// Тест проверяет, что таймаут транспорта не относится к ошибкам клиента.
    #[test]
    fn test_transport_error_is_not_client_fault() {
        assert!(!RequestError::ReadTimeout.is_client_fault());
        assert!(!QueueLockPoisoned.is_client_fault());
    }

    #[test]
    fn test_as_any_downcast() {
        let err: &dyn ErrorExt = &RequestError::UnknownTopic;
        assert!(err.as_any().downcast_ref::<RequestError>().is_some());
        assert!(err.as_any().downcast_ref::<QueueLockPoisoned>().is_none());
    }

    /// Тест проверяет набор тегов для структурированного лога.
    #[test]
    fn test_metrics_tags() {
        let tags = RequestError::UnknownTopic.metrics_tags();
        let get = |key: &str| {
            tags.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        };

        assert_eq!(get("error_type").as_deref(), Some("RequestError"));
        assert_eq!(get("status_code").as_deref(), Some("2010"));
        assert_eq!(get("category").as_deref(), Some("state"));
        assert_eq!(get("origin").as_deref(), Some("client"));

        let tags = QueueLockPoisoned.metrics_tags();
        assert!(tags.contains(&("origin", "broker".to_string())));
    }
}
