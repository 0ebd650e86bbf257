//! CLI клиент MQBroker
//!
//! Выполняет одну операцию брокера (SUBSCRIBE, UNSUBSCRIBE, PUBLISH,
//! RECEIVE) на отдельном соединении и печатает результат.

use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mqbroker::{ClientConfig, MqClient, ReceivedMessage};
use owo_colors::OwoColorize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

/// Основная структура CLI аргументов
#[derive(Parser)]
#[command(name = "mqbroker-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MQBroker CLI - Command line client for the MQBroker server", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Хост сервера (IP-адрес)
    #[arg(
        short = 'H',
        long,
        default_value = "127.0.0.1",
        env = "MQBROKER_HOST",
        help = "Server host to connect to"
    )]
    host: String,
    /// Порт сервера
    #[arg(
        short,
        long,
        default_value = "5000",
        env = "MQBROKER_PORT",
        help = "Server port to connect to"
    )]
    port: u16,
    /// Идентификатор приложения; если не задан, генерируется новый
    #[arg(
        short,
        long,
        env = "MQBROKER_APP_ID",
        help = "Application id (UUID); a fresh one is generated when omitted"
    )]
    app_id: Option<Uuid>,
    /// Таймаут соединения в секундах
    #[arg(long, default_value = "5", help = "Connect timeout in seconds")]
    timeout: u64,
    /// Таймаут чтения ответа в секундах
    #[arg(long, default_value = "5", help = "Response read timeout in seconds")]
    read_timeout: u64,
    /// Включить подробный вывод (debug)
    #[arg(short, long, help = "Enable debug output")]
    verbose: bool,
    /// Формат вывода результатов
    #[arg(long, value_enum, default_value = "pretty", help = "Output format")]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

/// Формат вывода CLI
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// Человекочитаемый формат
    Pretty,
    /// Полезная нагрузка ответа как есть
    Raw,
    /// JSON формат
    Json,
}

/// Подкоманды CLI
#[derive(Subcommand)]
enum Commands {
    /// Подписаться на тему (тема создаётся при необходимости)
    #[command(alias = "sub")]
    Subscribe { topic: String },
    /// Отменить подписку
    #[command(alias = "unsub")]
    Unsubscribe { topic: String },
    /// Опубликовать сообщение в существующую тему
    #[command(alias = "pub")]
    Publish {
        topic: String,
        content: String,
        /// Отправитель, если он отличается от app id
        #[arg(long)]
        sender: Option<Uuid>,
    },
    /// Забрать следующее сообщение из очереди подписки
    #[command(alias = "recv")]
    Receive { topic: String },
}

/// Результат выполнения команды для печати.
enum Outcome {
    Ack(String),
    Message(ReceivedMessage),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let server_addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .context("Invalid server address")?;
    let app_id = match cli.app_id {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4();
            if cli.output == OutputFormat::Pretty {
                eprintln!("{} {id}", "generated app id:".dimmed());
            }
            id
        }
    };

    let config = ClientConfig {
        connect_timeout: Duration::from_secs(cli.timeout),
        read_timeout: Duration::from_secs(cli.read_timeout),
        ..ClientConfig::default()
    };
    let client = MqClient::new(server_addr, app_id, config);
    debug!(%server_addr, %app_id, "Client configured");

    match run(&client, &cli.command).await {
        Ok(outcome) => {
            print_outcome(&outcome, cli.output, app_id);
            Ok(())
        }
        Err(e) => {
            debug!(tags = ?e.metrics_tags(), "Request failed");
            match cli.output {
                OutputFormat::Json => println!("{}", json!(e.to_response())),
                OutputFormat::Raw => eprintln!("ERROR|{}", e.client_message()),
                OutputFormat::Pretty if cli.verbose => {
                    eprintln!("{} {}", "(error)".red().bold(), e.report())
                }
                OutputFormat::Pretty => eprintln!("{} {e}", "(error)".red().bold()),
            }
            std::process::exit(1);
        }
    }
}

async fn run(
    client: &MqClient,
    command: &Commands,
) -> mqbroker::BrokerResult<Outcome> {
    match command {
        Commands::Subscribe { topic } => client.subscribe(topic).await.map(Outcome::Ack),
        Commands::Unsubscribe { topic } => client.unsubscribe(topic).await.map(Outcome::Ack),
        Commands::Publish {
            topic,
            content,
            sender,
        } => match sender {
            Some(sender) => client.publish_as(content, topic, *sender).await,
            None => client.publish(content, topic).await,
        }
        .map(Outcome::Ack),
        Commands::Receive { topic } => client.receive(topic).await.map(Outcome::Message),
    }
}

fn print_outcome(
    outcome: &Outcome,
    format: OutputFormat,
    app_id: Uuid,
) {
    match (outcome, format) {
        (Outcome::Ack(text), OutputFormat::Raw) => println!("OK|{text}"),
        (Outcome::Ack(text), OutputFormat::Pretty) => println!("{}", text.green()),
        (Outcome::Ack(text), OutputFormat::Json) => {
            println!("{}", json!({ "status": "ok", "app_id": app_id, "message": text }))
        }
        (Outcome::Message(msg), OutputFormat::Raw) => println!("OK|{}|{}", msg.content, msg.sender),
        (Outcome::Message(msg), OutputFormat::Pretty) => {
            println!("{} {}", "from".dimmed(), msg.sender.cyan());
            println!("{}", msg.content);
        }
        (Outcome::Message(msg), OutputFormat::Json) => {
            println!("{}", json!({ "status": "ok", "app_id": app_id, "message": msg }))
        }
    }
}

/// Логирование CLI: только ошибки, debug при `--verbose`.
fn init_logging(verbose: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if verbose { "debug" } else { "error" };
    fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli_definition() {
        Cli::command().debug_assert();
    }

    /// Тест проверяет разбор PUBLISH с явным отправителем и JSON-выводом.
    #[test]
    fn test_publish_with_sender_and_json_output() {
        let sender = Uuid::new_v4();
        let sender_arg = sender.to_string();
        let cli = Cli::try_parse_from([
            "mqbroker-cli",
            "-H",
            "10.0.0.7",
            "-p",
            "6000",
            "--output",
            "json",
            "publish",
            "news",
            "hello world",
            "--sender",
            sender_arg.as_str(),
        ])
        .unwrap();

        assert_eq!(cli.host, "10.0.0.7");
        assert_eq!(cli.port, 6000);
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Publish {
                topic,
                content,
                sender: Some(parsed),
            } => {
                assert_eq!(topic, "news");
                assert_eq!(content, "hello world");
                assert_eq!(parsed, sender);
            }
            _ => panic!("expected publish with sender"),
        }
    }

    /// Тест проверяет короткие алиасы подкоманд.
    #[test]
    fn test_subcommand_aliases() {
        let cli = Cli::try_parse_from(["mqbroker-cli", "recv", "news"]).unwrap();
        assert!(matches!(cli.command, Commands::Receive { ref topic } if topic == "news"));

        let cli = Cli::try_parse_from(["mqbroker-cli", "sub", "news"]).unwrap();
        assert!(matches!(cli.command, Commands::Subscribe { .. }));

        let cli = Cli::try_parse_from(["mqbroker-cli", "unsub", "news"]).unwrap();
        assert!(matches!(cli.command, Commands::Unsubscribe { .. }));
    }

    /// Тест проверяет, что некорректные значения отклоняются при разборе.
    #[test]
    fn test_rejects_invalid_values() {
        assert!(Cli::try_parse_from(["mqbroker-cli", "--output", "xml", "recv", "news"]).is_err());
        assert!(Cli::try_parse_from(["mqbroker-cli", "--app-id", "nope", "recv", "news"]).is_err());
        assert!(
            Cli::try_parse_from(["mqbroker-cli", "publish", "news", "x", "--sender", "42"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["mqbroker-cli", "publish", "news"]).is_err());
    }

    /// Тест проверяет значения по умолчанию для формата и таймаутов.
    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["mqbroker-cli", "-H", "127.0.0.1", "-p", "5000", "sub", "t"])
            .unwrap();
        assert_eq!(cli.output, OutputFormat::Pretty);
        assert_eq!(cli.timeout, 5);
        assert_eq!(cli.read_timeout, 5);
        assert!(!cli.verbose);
    }
}
