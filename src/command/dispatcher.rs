use std::{sync::Arc, time::Instant};

use mqbroker_error::{ErrorExt, LogLevel, ProtocolError};
use tracing::{debug, info, trace, warn};

use crate::{network::protocol, BrokerState, Command, CommandExecute, Response};

/// Диспетчер запросов.
///
/// Не хранит состояния между вызовами: переводит команды протокола в
/// операции над [`BrokerState`] и формирует ответ.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    state: Arc<BrokerState>,
}

impl Dispatcher {
    pub fn new(state: Arc<BrokerState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<BrokerState> {
        &self.state
    }

    /// Выполняет разобранную команду.
    pub fn dispatch(
        &self,
        command: &Command,
    ) -> Response {
        let start = Instant::now();
        let result = command.execute(&self.state);
        let elapsed_us = start.elapsed().as_micros() as u64;

        match result {
            Ok(payload) => {
                debug!(
                    command = command.name(),
                    app_id = %command.app_id(),
                    topic = command.topic(),
                    elapsed_us,
                    "command executed"
                );
                Response::ok(payload)
            }
            Err(err) => {
                log_rejection(command, &err, elapsed_us);
                Response::from_error(&err)
            }
        }
    }

    /// Разбирает строку запроса и выполняет её.
    ///
    /// Ошибка разбора превращается в `ERROR|<reason>` без изменения
    /// состояния.
    pub fn handle_line(
        &self,
        line: &str,
    ) -> Response {
        match protocol::parse_request(line) {
            Ok(command) => self.dispatch(&command),
            Err(err) => self.reject(&err),
        }
    }

    /// Декодирует сырой кадр (лимит размера, UTF-8) и выполняет запрос.
    pub fn handle_frame(
        &self,
        frame: &[u8],
        max_len: usize,
    ) -> Response {
        match protocol::decode_frame(frame, max_len) {
            Ok(line) => self.handle_line(line),
            Err(err) => self.reject(&err),
        }
    }

    /// Ответ на запрос, который не удалось разобрать.
    pub fn reject(
        &self,
        err: &ProtocolError,
    ) -> Response {
        warn!(
            reason = %err.log_message(),
            tags = ?err.metrics_tags(),
            "rejected malformed request"
        );
        Response::from_error(err)
    }
}

fn log_rejection<E: ErrorExt>(
    command: &Command,
    err: &E,
    elapsed_us: u64,
) {
    let app_id = command.app_id();
    let (name, topic) = (command.name(), command.topic());
    macro_rules! rejected {
        ($level:ident) => {
            $level!(
                command = name,
                %app_id,
                topic,
                elapsed_us,
                tags = ?err.metrics_tags(),
                reason = %err,
                "command rejected"
            )
        };
    }

    match err.status_code().log_level() {
        LogLevel::Trace => rejected!(trace),
        LogLevel::Debug => rejected!(debug),
        LogLevel::Info => rejected!(info),
        LogLevel::Warn | LogLevel::Error => rejected!(warn),
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::EnvFilter;
    use uuid::Uuid;

    use super::*;
    use crate::logging::capture::capture_logs;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(BrokerState::new()))
    }

    /// Тест проверяет полный сценарий через строки протокола.
    #[test]
    fn test_handle_line_scenario() {
        let d = dispatcher();
        let app = Uuid::new_v4();

        let run = |line: String| d.handle_line(&line).to_string();

        assert_eq!(run(format!("SUBSCRIBE|{app}|news")), "OK|subscription created");
        assert_eq!(run(format!("SUBSCRIBE|{app}|news")), "OK|already subscribed");
        assert_eq!(run(format!("PUBLISH|{app}|news|hello")), "OK|published");
        assert_eq!(run(format!("RECEIVE|{app}|news")), format!("OK|hello|{app}"));
        assert_eq!(run(format!("RECEIVE|{app}|news")), "ERROR|no messages available");
        assert_eq!(run(format!("UNSUBSCRIBE|{app}|news")), "OK|unsubscribed");
        assert_eq!(run(format!("UNSUBSCRIBE|{app}|news")), "ERROR|not subscribed");
        assert_eq!(run(format!("RECEIVE|{app}|news")), "ERROR|not subscribed");
    }

    /// Тест проверяет, что публикация в неизвестную тему не создаёт её.
    #[test]
    fn test_publish_unknown_topic() {
        let d = dispatcher();
        let app = Uuid::new_v4();
        let resp = d.handle_line(&format!("PUBLISH|{app}|ghost|x"));
        assert_eq!(resp, Response::error("topic does not exist"));
        assert!(!d.state().topics().exists("ghost"));
    }

    /// Тест проверяет, что отказ попадает в лог вместе с тегами ошибки.
    #[test]
    fn test_rejection_logs_error_tags() {
        let d = dispatcher();
        let app = Uuid::new_v4();

        let out = capture_logs(EnvFilter::new("trace"), || {
            d.handle_line(&format!("PUBLISH|{app}|ghost|x"));
            d.handle_line("FETCH|x|y");
        });

        assert!(out.contains("command rejected"), "{out}");
        assert!(out.contains(r#"("topic", "ghost")"#), "{out}");
        assert!(out.contains("rejected malformed request"), "{out}");
        assert!(out.contains(r#"("error_type", "protocol")"#), "{out}");
    }

    /// Тест проверяет, что ошибки разбора не трогают состояние.
    #[test]
    fn test_malformed_does_not_touch_state() {
        let d = dispatcher();
        let resp = d.handle_line("SUBSCRIBE|bad-uuid|news");
        assert!(!resp.is_ok());
        assert!(resp.payload().starts_with("invalid application id"));
        assert!(d.state().topics().is_empty());
    }

    /// Тест проверяет отказ по размеру и по UTF-8 на уровне кадра.
    #[test]
    fn test_handle_frame_limits() {
        let d = dispatcher();
        assert_eq!(
            d.handle_frame(&[b'x'; 32], 16),
            Response::error("request too large")
        );
        assert_eq!(
            d.handle_frame(&[0xc3, 0x28], 16),
            Response::error("invalid utf-8")
        );
    }
}
