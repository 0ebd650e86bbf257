pub mod broker;
pub mod client;
pub mod protocol;

// Публичный экспорт всех типов ошибок из вложенных модулей, чтобы упростить
// доступ к ним из внешнего кода.
pub use broker::*;
pub use client::*;
pub use protocol::*;
