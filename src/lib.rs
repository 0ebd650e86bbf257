/// Broker core: topic registry, subscription registry, per-subscription queues.
pub mod broker;
/// Client library: one TCP connection per request.
pub mod client;
/// Broker commands (SUBSCRIBE, UNSUBSCRIBE, PUBLISH, RECEIVE) and dispatcher.
pub mod command;
/// Server configuration loading.
pub mod config;
/// Startup and logging error types.
pub mod error;
/// Flexible logging (formatting, filters, sinks).
pub mod logging;
/// Network stack: line protocol and Tokio-based server.
pub mod network;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Broker state and its building blocks.
pub use broker::{
    BrokerState, BrokerStats, Message, QueueStore, Subscription, SubscriptionRegistry,
    TopicRegistry,
};
/// Client API.
pub use client::{ClientConfig, ClientConnection, MqClient, ReceivedMessage};
/// Broker commands and request dispatching.
pub use command::{
    Command, CommandExecute, Dispatcher, PublishCommand, ReceiveCommand, Response, Status,
    SubscribeCommand, UnsubscribeCommand,
};
/// config
pub use config::Settings;
/// Startup errors.
pub use error::{LoggingError, StartupError};
/// Broker-wide error types from the error crate.
pub use mqbroker_error::{
    BrokerError, BrokerResult, ClientError, ErrorExt, ProtocolError, QueueError, StackError,
    StatusCode,
};
/// Network server and protocol.
pub use network::{protocol, BrokerServer, ConnectionConfig, ConnectionManager};
