//! Команды брокера и их выполнение.
//!
//! - `execute`: трейт [`CommandExecute`] и enum [`Command`].
//! - `pubsub`: SUBSCRIBE, UNSUBSCRIBE, PUBLISH, RECEIVE.
//! - `response`: ответ `OK|...` / `ERROR|...`.
//! - `dispatcher`: [`Dispatcher`], точка входа для сетевого слоя.

pub mod dispatcher;
pub mod execute;
pub mod pubsub;
pub mod response;

// Публичный экспорт всех типов из вложенных модулей, чтобы упростить доступ к
// ним из внешнего кода.
pub use dispatcher::*;
pub use execute::*;
pub use pubsub::*;
pub use response::*;
