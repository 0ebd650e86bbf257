//! Текстовый протокол брокера.
//!
//! Запрос: одна строка `CMD|<appId>|<topic>[|<content>[|<senderAppId>]]`,
//! завершённая `\n` или закрытием записи на стороне клиента.
//! Ответ: `OK|<message>`, `OK|<content>|<senderAppId>` или `ERROR|<reason>`.

use mqbroker_error::ProtocolError;
use tracing::warn;
use uuid::Uuid;

use crate::{Command, Response};

/// Разделитель полей.
pub const FIELD_SEPARATOR: char = '|';

/// Минимальное число полей в запросе.
pub const MIN_REQUEST_FIELDS: usize = 3;

/// Убирает завершающие `\r` и `\n`.
pub fn trim_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// Проверяет размер кадра и декодирует его как UTF-8.
pub fn decode_frame(
    bytes: &[u8],
    max_len: usize,
) -> Result<&str, ProtocolError> {
    if bytes.len() > max_len {
        return Err(ProtocolError::RequestTooLarge {
            size: bytes.len(),
            max: max_len,
        });
    }
    std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)
}

/// Разбирает строку запроса в [`Command`].
///
/// Имя команды сравнивается без учёта регистра. Лишние поля после последнего
/// ожидаемого игнорируются. Неразборчивый `senderAppId` заменяется на
/// `appId` публикующего приложения.
pub fn parse_request(line: &str) -> Result<Command, ProtocolError> {
    let line = trim_line_ending(line);
    if line.is_empty() {
        return Err(ProtocolError::EmptyRequest);
    }

    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() < MIN_REQUEST_FIELDS {
        return Err(ProtocolError::TooFewFields {
            found: fields.len(),
        });
    }

    let name = fields[0].trim();
    let kind = CommandKind::from_name(name).ok_or_else(|| ProtocolError::UnknownCommand {
        command: name.to_string(),
    })?;
    let app_id = parse_app_id(fields[1])?;
    let topic = fields[2];
    if topic.is_empty() {
        return Err(ProtocolError::MissingTopic);
    }

    let command = match kind {
        CommandKind::Subscribe => Command::subscribe(app_id, topic),
        CommandKind::Unsubscribe => Command::unsubscribe(app_id, topic),
        CommandKind::Receive => Command::receive(app_id, topic),
        CommandKind::Publish => {
            let content = fields.get(3).ok_or(ProtocolError::MissingContent)?;
            let sender = fields.get(4).and_then(|raw| parse_sender(raw, app_id));
            Command::publish(app_id, topic, *content, sender)
        }
    };
    Ok(command)
}

/// Кодирует команду в строку запроса (без `\n`).
pub fn encode_request(command: &Command) -> String {
    let mut line = format!(
        "{}{sep}{}{sep}{}",
        command.name(),
        command.app_id(),
        command.topic(),
        sep = FIELD_SEPARATOR
    );
    if let Command::Publish(cmd) = command {
        line.push(FIELD_SEPARATOR);
        line.push_str(&cmd.content);
        if let Some(sender) = cmd.sender {
            line.push(FIELD_SEPARATOR);
            line.push_str(&sender.to_string());
        }
    }
    line
}

/// Кодирует ответ в строку с завершающим `\n`.
pub fn encode_response(response: &Response) -> String {
    format!("{response}\n")
}

/// Разбирает строку ответа сервера.
pub fn parse_response(line: &str) -> Result<Response, ProtocolError> {
    let line = trim_line_ending(line);
    match line.split_once(FIELD_SEPARATOR) {
        Some(("OK", payload)) => Ok(Response::ok(payload)),
        Some(("ERROR", reason)) => Ok(Response::error(reason)),
        _ => Err(ProtocolError::MalformedResponse {
            line: line.to_string(),
        }),
    }
}

/// Можно ли передать значение одним полем запроса.
pub fn is_valid_field(value: &str) -> bool {
    !value.contains([FIELD_SEPARATOR, '\n', '\r'])
}

////////////////////////////////////////////////////////////////////////////////
// Внутренние функции
////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Subscribe,
    Unsubscribe,
    Publish,
    Receive,
}

impl CommandKind {
    fn from_name(name: &str) -> Option<Self> {
        [
            ("SUBSCRIBE", Self::Subscribe),
            ("UNSUBSCRIBE", Self::Unsubscribe),
            ("PUBLISH", Self::Publish),
            ("RECEIVE", Self::Receive),
        ]
        .into_iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, kind)| kind)
    }
}

fn parse_app_id(raw: &str) -> Result<Uuid, ProtocolError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ProtocolError::InvalidAppId {
        value: raw.to_string(),
    })
}

fn parse_sender(
    raw: &str,
    app_id: Uuid,
) -> Option<Uuid> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match Uuid::parse_str(raw) {
        Ok(sender) => Some(sender),
        Err(err) => {
            warn!(
                %app_id,
                sender = raw,
                error = %err,
                "invalid sender id, falling back to publisher id"
            );
            None
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
