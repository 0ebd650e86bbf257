use std::{net::SocketAddr, time::Duration};

use mqbroker_error::{ensure, BrokerResult as ClientResult, ClientError};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::{client::ClientConnection, network::protocol, Command};

/// Конфигурация клиента.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Таймаут подключения
    pub connect_timeout: Duration,
    /// Таймаут чтения
    pub read_timeout: Duration,
    /// Таймаут записи
    pub write_timeout: Duration,
    /// Максимальная длина строки ответа
    pub max_response_bytes: usize,
}

/// Сообщение, полученное через RECEIVE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceivedMessage {
    pub content: String,
    pub sender: Uuid,
}

/// Клиент брокера.
///
/// Каждая операция открывает новое соединение, отправляет один запрос,
/// читает один ответ и закрывает соединение. Ответ `ERROR|<reason>`
/// превращается в [`ClientError::ServerError`].
#[derive(Debug, Clone)]
pub struct MqClient {
    addr: SocketAddr,
    app_id: Uuid,
    config: ClientConfig,
}

impl MqClient {
    pub fn new(
        addr: SocketAddr,
        app_id: Uuid,
        config: ClientConfig,
    ) -> Self {
        Self {
            addr,
            app_id,
            config,
        }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn app_id(&self) -> Uuid {
        self.app_id
    }

    /// Подписка на тему. Возвращает сообщение сервера
    /// (`subscription created` или `already subscribed`).
    pub async fn subscribe(
        &self,
        topic: &str,
    ) -> ClientResult<String> {
        check_field("topic", topic)?;
        self.execute(Command::subscribe(self.app_id, topic)).await
    }

    pub async fn unsubscribe(
        &self,
        topic: &str,
    ) -> ClientResult<String> {
        check_field("topic", topic)?;
        self.execute(Command::unsubscribe(self.app_id, topic)).await
    }

    /// Публикация от имени этого приложения.
    pub async fn publish(
        &self,
        content: &str,
        topic: &str,
    ) -> ClientResult<String> {
        self.publish_with(content, topic, None).await
    }

    /// Публикация с явным идентификатором отправителя.
    pub async fn publish_as(
        &self,
        content: &str,
        topic: &str,
        sender: Uuid,
    ) -> ClientResult<String> {
        self.publish_with(content, topic, Some(sender)).await
    }

    /// Забирает следующее сообщение из очереди подписки.
    pub async fn receive(
        &self,
        topic: &str,
    ) -> ClientResult<ReceivedMessage> {
        check_field("topic", topic)?;
        let payload = self.execute(Command::receive(self.app_id, topic)).await?;
        parse_received(&payload)
    }

    async fn publish_with(
        &self,
        content: &str,
        topic: &str,
        sender: Option<Uuid>,
    ) -> ClientResult<String> {
        check_field("topic", topic)?;
        check_field("content", content)?;
        self.execute(Command::publish(self.app_id, topic, content, sender))
            .await
    }

    /// Выполняет команду на новом соединении и возвращает полезную нагрузку
    /// ответа `OK|...`.
    pub async fn execute(
        &self,
        command: Command,
    ) -> ClientResult<String> {
        debug!(command = command.name(), topic = command.topic(), "Executing command");

        let connection = ClientConnection::connect(
            self.addr,
            self.config.connect_timeout,
            self.config.read_timeout,
            self.config.write_timeout,
            self.config.max_response_bytes,
        )
        .await?;

        let response = connection.execute_command(&command).await?;
        if response.is_ok() {
            Ok(response.into_payload())
        } else {
            Err(ClientError::ServerError {
                message: response.into_payload(),
            }
            .into())
        }
    }
}

/// Проверяет, что значение можно передать одним полем протокола.
fn check_field(
    name: &str,
    value: &str,
) -> ClientResult<()> {
    ensure!(
        name != "topic" || !value.is_empty(),
        ClientError::InvalidArgument {
            reason: "topic must not be empty".to_string(),
        }
    );
    ensure!(
        protocol::is_valid_field(value),
        ClientError::InvalidArgument {
            reason: format!("{name} must not contain '|' or line breaks"),
        }
    );
    Ok(())
}

/// Разбирает `<content>|<sender>` из ответа RECEIVE.
fn parse_received(payload: &str) -> ClientResult<ReceivedMessage> {
    let unexpected = || ClientError::UnexpectedResponse {
        line: payload.to_string(),
    };
    let (content, sender) = payload.rsplit_once('|').ok_or_else(unexpected)?;
    let sender = Uuid::parse_str(sender).map_err(|_| unexpected())?;
    Ok(ReceivedMessage {
        content: content.to_string(),
        sender,
    })
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            max_response_bytes: 64 * 1024 + 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use mqbroker_error::StatusCode;

    use super::*;

    fn client() -> MqClient {
        MqClient::new(
            "127.0.0.1:1".parse().unwrap(),
            Uuid::new_v4(),
            ClientConfig::default(),
        )
    }

    /// Тест проверяет разбор ответа RECEIVE.
    #[test]
    fn test_parse_received() {
        let sender = Uuid::new_v4();
        let msg = parse_received(&format!("hello world|{sender}")).unwrap();
        assert_eq!(msg.content, "hello world");
        assert_eq!(msg.sender, sender);

        let err = parse_received("no-sender").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::ProtocolError);
    }

    /// Тест проверяет, что содержимое с разделителем отклоняется до
    /// подключения.
    #[tokio::test]
    async fn test_publish_rejects_pipe_in_content() {
        let err = client().publish("a|b", "news").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidArgs);

        let err = client().publish("line\nbreak", "news").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidArgs);
    }

    #[tokio::test]
    async fn test_empty_topic_rejected() {
        let err = client().subscribe("").await.unwrap_err();
        assert!(err.to_string().contains("topic must not be empty"));
    }
}
