use std::collections::VecDeque;

use dashmap::DashMap;
use mqbroker_error::QueueError;

use super::{Message, Subscription};

/// Хранилище очередей: по одной FIFO-очереди на подписку.
///
/// Запись `DashMap` является единицей блокировки: enqueue и dequeue одной
/// подписки сериализуются, разные подписки не мешают друг другу (с точностью
/// до шарда).
#[derive(Debug, Default)]
pub struct QueueStore {
    queues: DashMap<Subscription, VecDeque<Message>>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Создаёт пустую очередь, если её ещё нет.
    pub fn create_queue(
        &self,
        sub: &Subscription,
    ) {
        self.queues.entry(sub.clone()).or_default();
    }

    /// Удаляет очередь вместе с непрочитанными сообщениями.
    pub fn remove_queue(
        &self,
        sub: &Subscription,
    ) -> bool {
        self.queues.remove(sub).is_some()
    }

    /// Кладёт сообщение в конец очереди.
    ///
    /// Возвращает `false` и ничего не делает, если очереди нет.
    pub fn enqueue(
        &self,
        sub: &Subscription,
        msg: Message,
    ) -> bool {
        match self.queues.get_mut(sub) {
            Some(mut queue) => {
                queue.push_back(msg);
                true
            }
            None => false,
        }
    }

    /// Забирает самое старое сообщение.
    pub fn dequeue(
        &self,
        sub: &Subscription,
    ) -> Result<Message, QueueError> {
        let mut queue = self.queues.get_mut(sub).ok_or(QueueError::Missing)?;
        queue.pop_front().ok_or(QueueError::Empty)
    }

    pub fn has_messages(
        &self,
        sub: &Subscription,
    ) -> bool {
        self.count(sub) > 0
    }

    /// Число сообщений в очереди (0, если очереди нет).
    pub fn count(
        &self,
        sub: &Subscription,
    ) -> usize {
        self.queues.get(sub).map_or(0, |q| q.len())
    }

    pub fn contains(
        &self,
        sub: &Subscription,
    ) -> bool {
        self.queues.contains_key(sub)
    }

    /// Число очередей.
    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    /// Суммарное число сообщений во всех очередях.
    pub fn total_messages(&self) -> usize {
        self.queues.iter().map(|entry| entry.value().len()).sum()
    }
}
