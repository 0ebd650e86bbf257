use mqbroker_error::{BrokerError, QueueError};
use tracing::trace;
use uuid::Uuid;

use super::{Message, QueueStore, Subscription, SubscriptionRegistry, TopicRegistry};

/// Состояние брокера: реестр тем, реестр подписок и очереди.
///
/// Создаётся явно и разделяется через `Arc`. Порядок захвата блокировок
/// всегда Topic → Subscription → Queue.
#[derive(Debug, Default)]
pub struct BrokerState {
    topics: TopicRegistry,
    subscriptions: SubscriptionRegistry,
    queues: QueueStore,
}

/// Снимок счётчиков состояния для диагностики.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BrokerStats {
    pub topics: usize,
    pub subscriptions: usize,
    pub queues: usize,
    pub pending_messages: usize,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl BrokerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn topics(&self) -> &TopicRegistry {
        &self.topics
    }

    pub(crate) fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    pub(crate) fn queues(&self) -> &QueueStore {
        &self.queues
    }

    pub fn topic_exists(
        &self,
        topic: &str,
    ) -> bool {
        self.topics.exists(topic)
    }

    /// Регистрирует тему без подписчиков. Возвращает `true`, если тема новая.
    pub fn create_topic(
        &self,
        topic: &str,
    ) -> bool {
        self.topics.create(topic)
    }

    pub fn list_topics(&self) -> Vec<String> {
        self.topics.list_all()
    }

    pub fn is_subscribed(
        &self,
        sub: &Subscription,
    ) -> bool {
        self.subscriptions.is_subscribed(sub)
    }

    pub fn subscribers(
        &self,
        topic: &str,
    ) -> Vec<Subscription> {
        self.subscriptions.by_topic(topic)
    }

    /// Число непрочитанных сообщений подписки, `None` если очереди нет.
    pub fn pending(
        &self,
        sub: &Subscription,
    ) -> Option<usize> {
        self.queues
            .contains(sub)
            .then(|| self.queues.count(sub))
    }

    /// Подписывает приложение на тему, создавая тему при необходимости.
    ///
    /// Очередь создаётся под блокировкой реестра подписок. Возвращает `true`,
    /// если подписка новая.
    pub fn subscribe(
        &self,
        app_id: Uuid,
        topic: &str,
    ) -> bool {
        let (key, topic_created) = self.topics.ensure(topic);
        if topic_created {
            trace!(topic, "topic created");
        }
        let sub = Subscription::new(app_id, key);
        self.subscriptions
            .add_with(&sub, |s| self.queues.create_queue(s))
    }

    /// Снимает подписку и удаляет её очередь с непрочитанными сообщениями.
    pub fn unsubscribe(
        &self,
        sub: &Subscription,
    ) -> bool {
        self.subscriptions.remove_with(sub, |s| {
            self.queues.remove_queue(s);
        })
    }

    /// Рассылает сообщение всем текущим подписчикам темы.
    ///
    /// Возвращает число очередей, в которые сообщение попало. Подписка,
    /// снятая между снимком и вставкой, молча пропускается.
    pub fn publish(
        &self,
        topic: &str,
        message: Message,
    ) -> Result<usize, BrokerError> {
        if !self.topics.exists(topic) {
            return Err(BrokerError::TopicNotFound {
                topic: topic.to_string(),
            });
        }

        let targets = self.subscriptions.by_topic(topic);
        let delivered = targets
            .iter()
            .filter(|sub| self.queues.enqueue(sub, message.clone()))
            .count();
        if delivered < targets.len() {
            trace!(
                topic,
                dropped = targets.len() - delivered,
                "subscriptions vanished during fan-out"
            );
        }
        Ok(delivered)
    }

    /// Забирает следующее сообщение подписки.
    pub fn receive(
        &self,
        sub: &Subscription,
    ) -> Result<Message, BrokerError> {
        // Очередь существует тогда и только тогда, когда есть подписка.
        self.queues
            .dequeue(sub)
            .map_err(|err: QueueError| BrokerError::from_queue(err, sub.topic()))
    }

    pub fn stats(&self) -> BrokerStats {
        BrokerStats {
            topics: self.topics.len(),
            subscriptions: self.subscriptions.len(),
            queues: self.queues.queue_count(),
            pending_messages: self.queues.total_messages(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет, что подписка создаёт тему и очередь.
    #[test]
    fn test_subscribe_creates_topic_and_queue() {
        let state = BrokerState::new();
        let app = Uuid::new_v4();

        assert!(state.subscribe(app, "news"));
        assert!(!state.subscribe(app, "news"));

        let sub = Subscription::new(app, "news");
        assert!(state.topics().exists("news"));
        assert!(state.subscriptions().is_subscribed(&sub));
        assert!(state.queues().contains(&sub));
    }

    /// Тест проверяет, что отписка удаляет очередь, но не тему.
    #[test]
    fn test_unsubscribe_removes_queue_keeps_topic() {
        let state = BrokerState::new();
        let app = Uuid::new_v4();
        state.subscribe(app, "news");
        let sub = Subscription::new(app, "news");
        state.publish("news", Message::new("x", app)).unwrap();

        assert!(state.unsubscribe(&sub));
        assert!(!state.unsubscribe(&sub));
        assert!(!state.queues().contains(&sub));
        assert!(state.topics().exists("news"));
        assert_eq!(state.stats().pending_messages, 0);
    }

    /// Тест проверяет публикацию в неизвестную тему и тему без подписчиков.
    #[test]
    fn test_publish_topic_checks() {
        let state = BrokerState::new();
        let app = Uuid::new_v4();

        let err = state.publish("ghost", Message::new("x", app)).unwrap_err();
        assert_eq!(
            err,
            BrokerError::TopicNotFound {
                topic: "ghost".to_string()
            }
        );

        assert!(state.create_topic("empty"));
        assert_eq!(state.publish("empty", Message::new("x", app)), Ok(0));
        assert!(state.topic_exists("empty"));
        assert_eq!(state.stats().queues, 0);
        assert!(state.pending(&Subscription::new(app, "empty")).is_none());
    }

    /// Тест проверяет, что рассылка не создаёт очередь для подписки, снятой
    /// до вставки сообщения.
    #[test]
    fn test_publish_skips_vanished_subscription() {
        let state = BrokerState::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        state.subscribe(a, "news");
        state.subscribe(b, "news");
        let gone = Subscription::new(b, "news");

        // Очередь пропала, а запись в реестре ещё есть: так выглядит гонка
        // с UNSUBSCRIBE между снимком подписчиков и вставкой.
        state.queues().remove_queue(&gone);

        assert_eq!(state.publish("news", Message::new("x", a)), Ok(1));
        assert!(!state.queues().contains(&gone));
        assert_eq!(state.stats().queues, 1);
    }

    /// Тест проверяет, что публичные представления состояния согласованы с
    /// реестрами: подписка видна тогда и только тогда, когда есть очередь.
    #[test]
    fn test_read_only_views() {
        let state = BrokerState::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        state.subscribe(a, "news");
        state.subscribe(b, "news");
        state.publish("news", Message::new("x", a)).unwrap();

        let sub = Subscription::new(a, "news");
        assert!(state.is_subscribed(&sub));
        assert_eq!(state.pending(&sub), Some(1));
        assert_eq!(state.subscribers("news").len(), 2);
        assert_eq!(state.list_topics(), vec!["news".to_string()]);

        state.unsubscribe(&sub);
        assert!(!state.is_subscribed(&sub));
        assert_eq!(state.pending(&sub), None);
        assert!(!state.create_topic("news"));
    }

    /// Тест проверяет рассылку и чтение сообщений.
    #[test]
    fn test_fan_out_and_receive() {
        let state = BrokerState::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        state.subscribe(a, "news");
        state.subscribe(b, "news");

        assert_eq!(state.publish("news", Message::new("hello", a)), Ok(2));

        for app in [a, b] {
            let msg = state.receive(&Subscription::new(app, "news")).unwrap();
            assert_eq!(msg.content(), "hello");
            assert_eq!(msg.sender(), a);
        }

        let err = state.receive(&Subscription::new(a, "news")).unwrap_err();
        assert_eq!(err.to_string(), "no messages available");
    }

    /// Тест проверяет RECEIVE без подписки.
    #[test]
    fn test_receive_not_subscribed() {
        let state = BrokerState::new();
        let err = state
            .receive(&Subscription::new(Uuid::new_v4(), "news"))
            .unwrap_err();
        assert_eq!(err.to_string(), "not subscribed");
    }

    #[test]
    fn test_stats() {
        let state = BrokerState::new();
        let a = Uuid::new_v4();
        state.subscribe(a, "news");
        state.subscribe(a, "sports");
        state.publish("news", Message::new("x", a)).unwrap();

        assert_eq!(
            state.stats(),
            BrokerStats {
                topics: 2,
                subscriptions: 2,
                queues: 2,
                pending_messages: 1,
            }
        );
    }
}
