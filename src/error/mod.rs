use std::{io, net::SocketAddr, path::PathBuf};

use thiserror::Error;

/// Ошибки инициализации логирования.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level: '{0}'")]
    InvalidLevel(String),

    #[error("Invalid log format: '{0}' (expected compact, pretty or json)")]
    InvalidFormat(String),

    #[error("Log file prefix must not be empty")]
    InvalidFilePrefix,

    #[error("File logging is disabled: no log directory configured")]
    FileSinkDisabled,

    #[error("Failed to create log directory {path:?}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to initialize file appender: {0}")]
    Appender(String),

    #[error("Global subscriber already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Ошибки запуска брокера: конфигурация, логирование, bind.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Invalid setting '{field}': {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет тексты ошибок запуска.
    #[test]
    fn test_startup_error_display() {
        let err = StartupError::InvalidListenAddress {
            address: "nowhere".into(),
            reason: "invalid socket address syntax".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid listen address 'nowhere': invalid socket address syntax"
        );

        let err: StartupError = LoggingError::InvalidLevel("loud".into()).into();
        assert_eq!(err.to_string(), "Logging error: Invalid log level: 'loud'");
    }

    /// Тест проверяет, что ошибка bind сохраняет источник.
    #[test]
    fn test_bind_error_keeps_source() {
        use std::error::Error as _;

        let err = StartupError::Bind {
            address: "127.0.0.1:5000".parse().unwrap(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };
        assert!(err.to_string().starts_with("Failed to bind 127.0.0.1:5000"));
        assert!(err.source().is_some());
    }
}
