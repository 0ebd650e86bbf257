//! Сетевой модуль брокера.
//!
//! ## Подмодули
//!
//! - `banner`: баннер для консольного вывода при старте брокера.
//! - `connection`: обработка соединения (один запрос, один ответ) и лимит
//!   одновременных соединений.
//! - `protocol`: текстовый протокол `CMD|appId|topic[|content[|sender]]`.
//! - `server`: TCP-акцептор, задача tokio на каждое соединение.

pub mod banner;
pub mod connection;
pub mod protocol;
pub mod server;

// Publicly re-export the most used types from the submodules to simplify
// access from external code.
pub use connection::{ActiveConnection, ConnectionConfig, ConnectionManager};
pub use server::BrokerServer;
