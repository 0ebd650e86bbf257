use std::{
    env,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{
    error::StartupError,
    logging::{ConsoleConfig, LogFormat, LoggingConfig},
    network::ConnectionConfig,
};

/// Префикс переменных окружения (`MQBROKER_LISTEN_ADDRESS`, ...).
pub const ENV_PREFIX: &str = "MQBROKER";
/// Переменная окружения с путём к файлу конфигурации.
pub const CONFIG_PATH_ENV: &str = "MQBROKER_CONFIG";
/// Файл конфигурации по умолчанию; его отсутствие не считается ошибкой.
pub const DEFAULT_CONFIG_FILE: &str = "mqbroker.toml";

pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Настройки процесса брокера.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub listen_address: String,
    /// Лимит одновременных соединений; `0` снимает ограничение.
    pub max_connections: usize,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub max_request_bytes: usize,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Каталог файлового лога; без него пишется только консоль.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Settings {
    /// Загружает настройки: значения по умолчанию, затем файл (путь из
    /// `MQBROKER_CONFIG` или `mqbroker.toml`), затем переменные окружения.
    pub fn load() -> Result<Self, StartupError> {
        let path = env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        // Явно указанный файл обязан существовать.
        let required = env::var_os(CONFIG_PATH_ENV).is_some();
        Self::load_from(&path, required)
    }

    /// Загружает настройки из указанного файла поверх значений по умолчанию.
    pub fn load_from(
        path: &Path,
        required: bool,
    ) -> Result<Self, StartupError> {
        let cfg = Self::defaults()?
            .add_source(File::from(path).required(required))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("listen_address", DEFAULT_LISTEN_ADDRESS)?
            .set_default("max_connections", 0_u64)?
            .set_default("read_timeout_ms", DEFAULT_TIMEOUT_MS)?
            .set_default("write_timeout_ms", DEFAULT_TIMEOUT_MS)?
            .set_default("max_request_bytes", DEFAULT_MAX_REQUEST_BYTES as u64)?
            .set_default("log_level", "info")?
            .set_default("log_format", LogFormat::Compact.as_str())
    }

    /// Проверяет значения, которые нельзя отвергнуть на этапе десериализации.
    pub fn validate(&self) -> Result<(), StartupError> {
        self.listen_addr()?;
        if self.read_timeout_ms == 0 {
            return Err(StartupError::InvalidSetting {
                field: "read_timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.write_timeout_ms == 0 {
            return Err(StartupError::InvalidSetting {
                field: "write_timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.max_request_bytes == 0 {
            return Err(StartupError::InvalidSetting {
                field: "max_request_bytes",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, StartupError> {
        self.listen_address
            .parse()
            .map_err(|e: std::net::AddrParseError| StartupError::InvalidListenAddress {
                address: self.listen_address.clone(),
                reason: e.to_string(),
            })
    }

    pub fn to_connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            max_connections: self.max_connections,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            max_request_bytes: self.max_request_bytes,
            ..ConnectionConfig::default()
        }
    }

    pub fn to_logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format,
            console: ConsoleConfig::default(),
            log_dir: self.log_dir.clone(),
            ..LoggingConfig::default()
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации
////////////////////////////////////////////////////////////////////////////////

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            max_connections: 0,
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            log_dir: None,
        }
    }
}
