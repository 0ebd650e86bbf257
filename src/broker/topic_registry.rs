use std::{collections::HashSet, sync::Arc};

use parking_lot::RwLock;

/// Реестр существующих тем.
///
/// Тема определяется только именем. Отсутствие темы отличается от темы без
/// подписчиков: PUBLISH в несуществующую тему отклоняется.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    topics: RwLock<HashSet<Arc<str>>>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(
        &self,
        name: &str,
    ) -> bool {
        self.topics.read().contains(name)
    }

    /// Создаёт тему. Возвращает `false`, если она уже есть.
    pub fn create(
        &self,
        name: &str,
    ) -> bool {
        self.ensure(name).1
    }

    /// Возвращает общий ключ темы, создавая её при отсутствии.
    ///
    /// Второй элемент кортежа равен `true`, если тема была создана этим
    /// вызовом.
    pub fn ensure(
        &self,
        name: &str,
    ) -> (Arc<str>, bool) {
        if let Some(existing) = self.topics.read().get(name) {
            return (existing.clone(), false);
        }

        let mut topics = self.topics.write();
        // Между read и write тему мог создать другой поток.
        if let Some(existing) = topics.get(name) {
            return (existing.clone(), false);
        }
        let key: Arc<str> = Arc::from(name);
        topics.insert(key.clone());
        (key, true)
    }

    /// Удаляет тему. Возвращает `false`, если её не было.
    pub fn remove(
        &self,
        name: &str,
    ) -> bool {
        self.topics.write().remove(name)
    }

    /// Снимок имён всех тем (порядок не определён).
    pub fn list_all(&self) -> Vec<String> {
        self.topics.read().iter().map(|t| t.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.topics.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.read().is_empty()
    }
}
