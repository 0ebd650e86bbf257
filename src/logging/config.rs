use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::LoggingError;

/// Допустимые уровни логирования.
const VALID_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Формат вывода событий.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Настройки консольного вывода.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub enabled: bool,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_line_numbers: bool,
}

/// Конфигурация системы логирования брокера.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Базовый уровень (`info`) или полная директива `EnvFilter`
    /// (`mqbroker=debug,tokio=warn`).
    pub level: String,
    pub format: LogFormat,
    pub console: ConsoleConfig,
    /// Каталог для файлового лога. `None` отключает файловый sink.
    pub log_dir: Option<PathBuf>,
    /// Префикс имени файла; к нему добавляется дата ротации.
    pub file_prefix: String,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

impl LoggingConfig {
    /// Формирует директиву фильтра из `level`.
    ///
    /// Простой уровень применяется ко всему процессу, а полная директива
    /// передаётся как есть.
    pub fn build_filter_directive(&self) -> String {
        let level = self.level.trim();
        if level.contains('=') || level.contains(',') {
            level.to_string()
        } else {
            level.to_ascii_lowercase()
        }
    }

    /// Проверяет конфигурацию до инициализации subscriber'а.
    pub fn validate(&self) -> Result<(), LoggingError> {
        let level = self.level.trim();
        if level.is_empty() {
            return Err(LoggingError::InvalidLevel(self.level.clone()));
        }
        if !level.contains('=')
            && !level.contains(',')
            && !VALID_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            return Err(LoggingError::InvalidLevel(self.level.clone()));
        }
        if self.log_dir.is_some() && self.file_prefix.trim().is_empty() {
            return Err(LoggingError::InvalidFilePrefix);
        }
        Ok(())
    }

    /// Создаёт каталог логов, если файловый sink включён.
    pub fn ensure_log_dir(&self) -> Result<(), LoggingError> {
        if let Some(dir) = &self.log_dir {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::LogDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn file_enabled(&self) -> bool {
        self.log_dir.is_some()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации
////////////////////////////////////////////////////////////////////////////////

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            with_ansi: atty::is(atty::Stream::Stdout),
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            console: ConsoleConfig::default(),
            log_dir: None,
            file_prefix: "mqbroker.log".to_string(),
        }
    }
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(LoggingError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет значения по умолчанию: info, compact, без файла.
    #[test]
    fn test_default_config() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.level, "info");
        assert_eq!(cfg.format, LogFormat::Compact);
        assert!(!cfg.file_enabled());
        assert!(cfg.validate().is_ok());
    }

    /// Тест проверяет, что простой уровень нормализуется, а полная
    /// директива передаётся без изменений.
    #[test]
    fn test_build_filter_directive() {
        let mut cfg = LoggingConfig {
            level: "DEBUG".into(),
            ..Default::default()
        };
        assert_eq!(cfg.build_filter_directive(), "debug");

        cfg.level = "mqbroker=trace,tokio=warn".into();
        assert_eq!(cfg.build_filter_directive(), "mqbroker=trace,tokio=warn");
    }

    /// Тест проверяет отказ на неизвестном уровне и пустом префиксе файла.
    #[test]
    fn test_validate_rejects_bad_values() {
        let cfg = LoggingConfig {
            level: "loud".into(),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(LoggingError::InvalidLevel(_))));

        let cfg = LoggingConfig {
            log_dir: Some(PathBuf::from("logs")),
            file_prefix: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(LoggingError::InvalidFilePrefix)
        ));
    }

    /// Тест проверяет разбор формата без учёта регистра.
    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    /// Тест проверяет создание вложенного каталога логов.
    #[test]
    fn test_ensure_log_dir_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("logs");
        let cfg = LoggingConfig {
            log_dir: Some(dir.clone()),
            ..Default::default()
        };
        cfg.ensure_log_dir().unwrap();
        assert!(dir.is_dir());
    }
}
