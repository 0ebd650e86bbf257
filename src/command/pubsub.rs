use mqbroker_error::BrokerError;
use uuid::Uuid;

use crate::{BrokerState, CommandExecute, Message, Subscription};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeCommand {
    pub app_id: Uuid,
    pub topic: String,
}

impl CommandExecute for SubscribeCommand {
    fn execute(
        &self,
        state: &BrokerState,
    ) -> Result<String, BrokerError> {
        if state.subscribe(self.app_id, &self.topic) {
            Ok("subscription created".to_string())
        } else {
            Ok("already subscribed".to_string())
        }
    }

    fn command_name(&self) -> &'static str {
        "SUBSCRIBE"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsubscribeCommand {
    pub app_id: Uuid,
    pub topic: String,
}

impl CommandExecute for UnsubscribeCommand {
    fn execute(
        &self,
        state: &BrokerState,
    ) -> Result<String, BrokerError> {
        let sub = Subscription::new(self.app_id, self.topic.as_str());
        if state.unsubscribe(&sub) {
            Ok("unsubscribed".to_string())
        } else {
            Err(BrokerError::NotSubscribed {
                topic: self.topic.clone(),
            })
        }
    }

    fn command_name(&self) -> &'static str {
        "UNSUBSCRIBE"
    }
}

/// PUBLISH: рассылка содержимого всем подписчикам темы.
///
/// Если `sender` не задан, отправителем считается `app_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishCommand {
    pub app_id: Uuid,
    pub topic: String,
    pub content: String,
    pub sender: Option<Uuid>,
}

impl PublishCommand {
    pub fn effective_sender(&self) -> Uuid {
        self.sender.unwrap_or(self.app_id)
    }
}

impl CommandExecute for PublishCommand {
    fn execute(
        &self,
        state: &BrokerState,
    ) -> Result<String, BrokerError> {
        let message = Message::new(self.content.as_str(), self.effective_sender());
        state.publish(&self.topic, message)?;
        Ok("published".to_string())
    }

    fn command_name(&self) -> &'static str {
        "PUBLISH"
    }
}

/// RECEIVE: извлечение одного сообщения; ответ `<content>|<sender>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveCommand {
    pub app_id: Uuid,
    pub topic: String,
}

impl CommandExecute for ReceiveCommand {
    fn execute(
        &self,
        state: &BrokerState,
    ) -> Result<String, BrokerError> {
        let sub = Subscription::new(self.app_id, self.topic.as_str());
        let message = state.receive(&sub)?;
        Ok(format!("{}|{}", message.content(), message.sender()))
    }

    fn command_name(&self) -> &'static str {
        "RECEIVE"
    }
}
