//! Ядро брокера: темы, подписки и очереди сообщений.
//!
//! - `topic_registry`: множество существующих тем.
//! - `subscription_registry`: пары `(app_id, topic)`, индекс по теме.
//! - `queue_store`: FIFO-очередь на каждую подписку.
//! - `state`: [`BrokerState`], владеющий всеми тремя компонентами.
//! - `message`, `subscription`: значения, которыми оперирует ядро.

pub mod message;
pub mod queue_store;
pub mod state;
pub mod subscription;
pub mod subscription_registry;
pub mod topic_registry;

// Публичный экспорт всех типов из вложенных модулей, чтобы упростить доступ к
// ним из внешнего кода.
pub use message::*;
pub use queue_store::*;
pub use state::*;
pub use subscription::*;
pub use subscription_registry::*;
pub use topic_registry::*;
