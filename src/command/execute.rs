//! Абстракция и диспетчеризация команд брокера.
//!
//! Содержит трейт [`CommandExecute`] для унифицированного выполнения команд и
//! enum [`Command`], инкапсулирующий все поддерживаемые команды.

use mqbroker_error::BrokerError;
use uuid::Uuid;

use super::{PublishCommand, ReceiveCommand, SubscribeCommand, UnsubscribeCommand};
use crate::BrokerState;

pub trait CommandExecute: std::fmt::Debug {
    /// Выполняет команду над состоянием брокера.
    ///
    /// # Возвращает
    /// - `Ok(String)` — полезная нагрузка ответа `OK|<payload>`.
    /// - `Err(BrokerError)` — предусловие не выполнено (нет темы, нет
    ///   подписки, пустая очередь).
    fn execute(
        &self,
        state: &BrokerState,
    ) -> Result<String, BrokerError>;

    /// Возвращает имя команды для logging
    fn command_name(&self) -> &'static str {
        "UNKNOWN"
    }
}

/// Перечисление всех поддерживаемых команд.
///
/// Обычно получается разбором строки запроса в
/// [`parse_request`](crate::network::protocol::parse_request).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Subscribe(SubscribeCommand),
    Unsubscribe(UnsubscribeCommand),
    Publish(PublishCommand),
    Receive(ReceiveCommand),
}

impl Command {
    pub fn subscribe(
        app_id: Uuid,
        topic: impl Into<String>,
    ) -> Self {
        Self::Subscribe(SubscribeCommand {
            app_id,
            topic: topic.into(),
        })
    }

    pub fn unsubscribe(
        app_id: Uuid,
        topic: impl Into<String>,
    ) -> Self {
        Self::Unsubscribe(UnsubscribeCommand {
            app_id,
            topic: topic.into(),
        })
    }

    pub fn publish(
        app_id: Uuid,
        topic: impl Into<String>,
        content: impl Into<String>,
        sender: Option<Uuid>,
    ) -> Self {
        Self::Publish(PublishCommand {
            app_id,
            topic: topic.into(),
            content: content.into(),
            sender,
        })
    }

    pub fn receive(
        app_id: Uuid,
        topic: impl Into<String>,
    ) -> Self {
        Self::Receive(ReceiveCommand {
            app_id,
            topic: topic.into(),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Subscribe(cmd) => cmd.command_name(),
            Command::Unsubscribe(cmd) => cmd.command_name(),
            Command::Publish(cmd) => cmd.command_name(),
            Command::Receive(cmd) => cmd.command_name(),
        }
    }

    /// Приложение, отправившее запрос.
    pub fn app_id(&self) -> Uuid {
        match self {
            Command::Subscribe(cmd) => cmd.app_id,
            Command::Unsubscribe(cmd) => cmd.app_id,
            Command::Publish(cmd) => cmd.app_id,
            Command::Receive(cmd) => cmd.app_id,
        }
    }

    pub fn topic(&self) -> &str {
        match self {
            Command::Subscribe(cmd) => &cmd.topic,
            Command::Unsubscribe(cmd) => &cmd.topic,
            Command::Publish(cmd) => &cmd.topic,
            Command::Receive(cmd) => &cmd.topic,
        }
    }
}

impl CommandExecute for Command {
    fn execute(
        &self,
        state: &BrokerState,
    ) -> Result<String, BrokerError> {
        match self {
            Command::Subscribe(cmd) => cmd.execute(state),
            Command::Unsubscribe(cmd) => cmd.execute(state),
            Command::Publish(cmd) => cmd.execute(state),
            Command::Receive(cmd) => cmd.execute(state),
        }
    }

    fn command_name(&self) -> &'static str {
        self.name()
    }
}
