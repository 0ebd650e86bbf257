use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use parking_lot::RwLock;
use uuid::Uuid;

use super::Subscription;

/// Реестр подписок `(app_id, topic)`.
///
/// Индексирован по теме: рассылка PUBLISH получает подписчиков темы одним
/// поиском. Пустые множества удаляются, сами темы живут в
/// [`TopicRegistry`](super::TopicRegistry).
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    by_topic: RwLock<HashMap<Arc<str>, HashSet<Uuid>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(
        &self,
        sub: &Subscription,
    ) -> bool {
        self.by_topic
            .read()
            .get(sub.topic())
            .is_some_and(|apps| apps.contains(&sub.app_id()))
    }

    /// Добавляет подписку. Возвращает `true`, если пара новая.
    pub fn add(
        &self,
        sub: &Subscription,
    ) -> bool {
        self.add_with(sub, |_| {})
    }

    /// Добавляет подписку и, если она новая, вызывает `on_added` под
    /// блокировкой реестра.
    ///
    /// Никто не увидит подписку раньше, чем отработает `on_added`.
    pub fn add_with<F>(
        &self,
        sub: &Subscription,
        on_added: F,
    ) -> bool
    where
        F: FnOnce(&Subscription),
    {
        let mut map = self.by_topic.write();
        let added = map
            .entry(sub.topic_key().clone())
            .or_default()
            .insert(sub.app_id());
        if added {
            on_added(sub);
        }
        added
    }

    /// Удаляет подписку. Возвращает `false`, если её не было.
    pub fn remove(
        &self,
        sub: &Subscription,
    ) -> bool {
        self.remove_with(sub, |_| {})
    }

    /// Удаляет подписку и, если она была, вызывает `on_removed` под
    /// блокировкой реестра.
    pub fn remove_with<F>(
        &self,
        sub: &Subscription,
        on_removed: F,
    ) -> bool
    where
        F: FnOnce(&Subscription),
    {
        let mut map = self.by_topic.write();
        let Some(apps) = map.get_mut(sub.topic()) else {
            return false;
        };

        let removed = apps.remove(&sub.app_id());
        if apps.is_empty() {
            map.remove(sub.topic());
        }
        if removed {
            on_removed(sub);
        }
        removed
    }

    /// Снимок подписок на тему. Используется для рассылки.
    pub fn by_topic(
        &self,
        topic: &str,
    ) -> Vec<Subscription> {
        let map = self.by_topic.read();
        match map.get_key_value(topic) {
            Some((key, apps)) => apps
                .iter()
                .map(|app| Subscription::new(*app, key.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Все подписки приложения.
    pub fn by_application(
        &self,
        app_id: Uuid,
    ) -> Vec<Subscription> {
        self.by_topic
            .read()
            .iter()
            .filter(|(_, apps)| apps.contains(&app_id))
            .map(|(topic, _)| Subscription::new(app_id, topic.clone()))
            .collect()
    }

    /// Общее число подписок.
    pub fn len(&self) -> usize {
        self.by_topic.read().values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_topic.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// Тест проверяет идемпотентность add и результат remove.
    #[test]
    fn test_add_remove() {
        let reg = SubscriptionRegistry::new();
        let sub = Subscription::new(Uuid::new_v4(), "news");

        assert!(reg.add(&sub));
        assert!(!reg.add(&sub));
        assert!(reg.is_subscribed(&sub));
        assert_eq!(reg.len(), 1);

        assert!(reg.remove(&sub));
        assert!(!reg.remove(&sub));
        assert!(!reg.is_subscribed(&sub));
        assert!(reg.is_empty());
    }

    /// Тест проверяет, что колбэки вызываются только при изменении.
    #[test]
    fn test_callbacks_fire_on_change_only() {
        let reg = SubscriptionRegistry::new();
        let sub = Subscription::new(Uuid::new_v4(), "news");
        let calls = Cell::new(0);

        reg.add_with(&sub, |_| calls.set(calls.get() + 1));
        reg.add_with(&sub, |_| calls.set(calls.get() + 1));
        assert_eq!(calls.get(), 1);

        reg.remove_with(&sub, |_| calls.set(calls.get() + 1));
        reg.remove_with(&sub, |_| calls.set(calls.get() + 1));
        assert_eq!(calls.get(), 2);
    }

    /// Тест проверяет выборку по теме и по приложению.
    #[test]
    fn test_queries() {
        let reg = SubscriptionRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        reg.add(&Subscription::new(a, "news"));
        reg.add(&Subscription::new(b, "news"));
        reg.add(&Subscription::new(a, "sports"));

        let mut news = reg.by_topic("news");
        news.sort();
        let mut expected = vec![Subscription::new(a, "news"), Subscription::new(b, "news")];
        expected.sort();
        assert_eq!(news, expected);

        assert!(reg.by_topic("weather").is_empty());
        assert_eq!(reg.by_application(a).len(), 2);
        assert_eq!(reg.by_application(b), vec![Subscription::new(b, "news")]);
        assert_eq!(reg.len(), 3);
    }

    /// Тест проверяет, что удаление чужой пары не трогает остальные.
    #[test]
    fn test_remove_keeps_other_subscribers() {
        let reg = SubscriptionRegistry::new();
        let a = Subscription::new(Uuid::new_v4(), "news");
        let b = Subscription::new(Uuid::new_v4(), "news");
        reg.add(&a);
        reg.add(&b);

        assert!(reg.remove(&a));
        assert!(reg.is_subscribed(&b));
        assert_eq!(reg.by_topic("news"), vec![b]);
    }
}
